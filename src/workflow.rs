//! The per-build pipeline: resolve the pull request, fetch its details,
//! enforce the file policy, classify the change and then either comment on
//! the open pull request or publish the new version.
use derive_builder::Builder;
use log::*;
use semver::Version;
use std::{
    path::{Path, PathBuf},
    rc::Rc,
};

use crate::{
    Result,
    changelog::{self, Entry},
    classifier::{Classification, Classifier},
    config::Config,
    error::ProteusError,
    forge::{request::CommentRequest, traits::Forge},
    policy::{self, PolicyOutcome},
    pull_request::{self, PullRequest},
    repo::{PublishRequest, VersionControl},
    version,
};

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The pull request targets another branch and gating is enabled.
    Skipped { target: String },
    /// The open pull request was classified and told about it.
    Commented { classification: Classification },
    /// The new version was committed, tagged and pushed.
    Published {
        version: Version,
        tag: String,
        commit: String,
    },
}

#[derive(Builder)]
#[builder(setter(into), build_fn(private, name = "_build"))]
pub struct WorkflowParams {
    pub config: Rc<Config>,
    pub forge: Rc<dyn Forge>,
    pub vcs: Rc<dyn VersionControl>,
    /// Repository root that the version and changelog paths are relative to
    pub workdir: PathBuf,
    /// PR number handed to the build, if any
    #[builder(default)]
    pub pr_number: Option<String>,
}

impl WorkflowParamsBuilder {
    pub fn build(&self) -> Result<Workflow> {
        let params = self._build().map_err(|e| {
            ProteusError::invalid_config(format!(
                "Failed to build workflow: {}",
                e
            ))
        })?;
        Workflow::new(params)
    }
}

pub struct Workflow {
    config: Rc<Config>,
    forge: Rc<dyn Forge>,
    vcs: Rc<dyn VersionControl>,
    workdir: PathBuf,
    pr_number: Option<String>,
    classifier: Classifier,
}

impl Workflow {
    pub fn builder() -> WorkflowParamsBuilder {
        WorkflowParamsBuilder::default()
    }

    pub fn new(params: WorkflowParams) -> Result<Self> {
        let classifier = Classifier::new(&params.config.keywords)?;

        Ok(Self {
            config: params.config,
            forge: params.forge,
            vcs: params.vcs,
            workdir: params.workdir,
            pr_number: params.pr_number,
            classifier,
        })
    }

    pub async fn run(&self) -> Result<Outcome> {
        let pr_ref = pull_request::resolve(
            self.pr_number.as_deref(),
            self.vcs.as_ref(),
        )?;

        let details = self.forge.get_pull_request(pr_ref.number).await?;
        let pr = PullRequest::new(pr_ref, details);

        if self.config.skip_non_mainline_targets
            && !pr.targets(&self.config.mainline_branch)
        {
            info!(
                "pull request #{} targets {} rather than {}: nothing to do",
                pr.number, pr.merge_target, self.config.mainline_branch
            );
            return Ok(Outcome::Skipped {
                target: pr.merge_target,
            });
        }

        if pr.is_open {
            self.enforce_policy(&pr).await?;
        }

        let current =
            version::read_version_file(&self.path(&self.config.version_file))?
                .version();

        let classification = match self.classifier.classify(&pr.body, &current)
        {
            Ok(classification) => classification,
            Err(ProteusError::NoChangeKeyword { help }) => {
                if pr.is_open {
                    let text = format!("{help}{}", self.fail_image(&pr));
                    self.comment_on_failure(&pr, text).await;
                }
                return Err(ProteusError::NoChangeKeyword { help });
            }
            Err(err) => return Err(err),
        };

        if pr.is_open {
            let text = classification.description().to_string();
            self.comment(&pr, text.clone()).await?;
            info!("Commented on pull request to state: {text}");
            return Ok(Outcome::Commented { classification });
        }

        self.publish(&pr, &classification)
    }

    async fn enforce_policy(&self, pr: &PullRequest) -> Result<()> {
        let protected = self.config.protected_files();

        match policy::validate(self.vcs.as_ref(), &protected)? {
            PolicyOutcome::Violation(files) => {
                let message = policy::violation_message(&protected);
                let text = format!("{message}{}", self.fail_image(pr));
                self.comment_on_failure(pr, text).await;
                Err(ProteusError::PolicyViolation { message, files })
            }
            PolicyOutcome::Clean | PolicyOutcome::PublishCommit(_) => Ok(()),
        }
    }

    fn publish(
        &self,
        pr: &PullRequest,
        classification: &Classification,
    ) -> Result<Outcome> {
        let next = &classification.next;
        info!("New version number: {next}");

        if !self.config.ci_version_parameter.is_empty() {
            println!(
                "##teamcity[setParameter name='{}' value='{}']",
                self.config.ci_version_parameter, next
            );
        }

        let remote = self.forge.remote_config();
        let pr_link = remote.pull_request_link(pr.number);

        let entry = Entry {
            version: next,
            pr_number: pr.number,
            pr_link: &pr_link,
            created_at: &pr.created_at,
            title: &pr.title,
            body: &pr.body,
        };

        version::write_version_file(
            &self.path(&self.config.version_file),
            next,
        )?;
        changelog::update_changelog_file(
            &self.path(&self.config.changelog_file),
            &entry,
        )?;

        let tag = format!("{}{}", self.config.tag_prefix, next);

        let commit = self
            .vcs
            .publish(&PublishRequest {
                files: vec![
                    self.config.version_file.clone(),
                    self.config.changelog_file.clone(),
                ],
                message: self.config.commit_message.clone(),
                tag: tag.clone(),
                branch: self.config.mainline_branch.clone(),
                remote: self.config.remote.clone(),
            })
            .inspect_err(|err| {
                error!(
                    "publish of {tag} did not complete ({err}): inspect the repository and remote before re-running"
                )
            })?;

        info!("published {tag} as {commit}");

        Ok(Outcome::Published {
            version: next.clone(),
            tag,
            commit,
        })
    }

    async fn comment(&self, pr: &PullRequest, body: String) -> Result<()> {
        self.forge
            .post_comment(CommentRequest {
                pr_number: pr.number,
                comments_url: pr.comments_url.clone(),
                body,
            })
            .await
    }

    /// Post feedback for a failing run. The run's own error is what gets
    /// reported, so a failed post is only logged.
    async fn comment_on_failure(&self, pr: &PullRequest, body: String) {
        if let Err(err) = self.comment(pr, body).await {
            error!("{err}");
        }
    }

    fn fail_image(&self, pr: &PullRequest) -> String {
        let images = &self.config.fail_images;
        if images.is_empty() {
            return String::new();
        }
        let image = &images[(pr.number % images.len() as u64) as usize];
        format!("\n\n![#FAIL]({image})")
    }

    fn path(&self, file: &str) -> PathBuf {
        Path::new(&self.workdir).join(file)
    }
}
