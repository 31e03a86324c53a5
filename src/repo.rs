//! Local git repository operations.
//!
//! The workflow only needs four things from version control: the last
//! commit message, the parents of `HEAD`, the files changed since a commit
//! and the final commit/tag/push. They sit behind [`VersionControl`] so the
//! decision logic can run against a mock; [`Repository`] implements them
//! with `git2` on the build checkout.
use git2::{CredentialType, Oid, RemoteCallbacks};
#[cfg(test)]
use mockall::automock;
use log::*;
use secrecy::{ExposeSecret, SecretString};
use std::path::Path;

use crate::{
    Result,
    error::{ProteusError, PublishStep},
};

/// Everything needed to publish the updated version and changelog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    /// Files to stage, relative to the repository root
    pub files: Vec<String>,
    /// Commit message
    pub message: String,
    /// Tag to create on the new commit
    pub tag: String,
    /// Branch on the remote that receives the commit
    pub branch: String,
    /// Remote to push to
    pub remote: String,
}

#[cfg_attr(test, automock)]
pub trait VersionControl {
    /// Full message of the `HEAD` commit.
    fn last_commit_message(&self) -> Result<String>;
    /// Parent commit ids of `HEAD`, first parent first.
    fn head_parents(&self) -> Result<Vec<String>>;
    /// Paths that differ between `commit` and the working tree.
    fn changed_files_since(&self, commit: &str) -> Result<Vec<String>>;
    /// Stage, commit, tag and push. Returns the new commit id.
    fn publish(&self, req: &PublishRequest) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthMethod {
    SshAgent,
    Token,
    Default,
}

/// Credentials already offered during one push. libgit2 calls the
/// credentials callback again after a rejection, so each method is
/// offered at most once.
#[derive(Debug, Default)]
struct AuthAttempts {
    ssh_agent: bool,
    token: bool,
    default: bool,
}

impl AuthAttempts {
    fn next(
        &mut self,
        allowed: CredentialType,
        has_token: bool,
    ) -> Option<AuthMethod> {
        if allowed.contains(CredentialType::SSH_KEY) && !self.ssh_agent {
            self.ssh_agent = true;
            return Some(AuthMethod::SshAgent);
        }
        if allowed.contains(CredentialType::USER_PASS_PLAINTEXT)
            && has_token
            && !self.token
        {
            self.token = true;
            return Some(AuthMethod::Token);
        }
        if !self.default {
            self.default = true;
            return Some(AuthMethod::Default);
        }
        None
    }
}

/// Create Git authentication callbacks. SSH remotes use the agent, HTTPS
/// remotes use the forge token.
fn get_auth_callbacks<'r>(user: String, token: String) -> RemoteCallbacks<'r> {
    let mut callbacks = git2::RemoteCallbacks::new();
    let mut attempts = AuthAttempts::default();
    callbacks.credentials(move |url, username, allowed| {
        match attempts.next(allowed, !token.is_empty()) {
            Some(AuthMethod::SshAgent) => {
                git2::Cred::ssh_key_from_agent(username.unwrap_or("git"))
            }
            Some(AuthMethod::Token) => {
                git2::Cred::userpass_plaintext(&user, &token)
            }
            Some(AuthMethod::Default) => git2::Cred::default(),
            None => Err(git2::Error::from_str(&format!(
                "all credentials were rejected by {url}"
            ))),
        }
    });
    // a rejected ref does not fail the push on its own
    callbacks.push_update_reference(|refname, status| match status {
        Some(msg) => Err(git2::Error::from_str(&format!(
            "remote rejected {refname}: {msg}"
        ))),
        None => Ok(()),
    });
    callbacks
}

/// Build checkout backed by `git2`.
pub struct Repository {
    repo: git2::Repository,
    token: SecretString,
}

impl Repository {
    /// Open the repository containing `path`.
    pub fn open(path: &Path, token: SecretString) -> Result<Self> {
        let repo = git2::Repository::discover(path)?;
        Ok(Self { repo, token })
    }

    /// Get the repository's working directory path.
    pub fn workdir(&self) -> Result<&Path> {
        self.repo.workdir().ok_or_else(|| {
            ProteusError::Git(git2::Error::from_str(
                "Repository has no working directory",
            ))
        })
    }

    fn signature(&self) -> Result<git2::Signature<'static>> {
        let config = self.repo.config()?.snapshot()?;
        let user = config.get_str("user.name")?;
        let email = config.get_str("user.email")?;
        debug!("using committer: user: {user}, email: {email}");
        Ok(git2::Signature::now(user, email)?)
    }

    fn stage(&self, files: &[String]) -> Result<()> {
        debug!("adding {} to index", files.join(", "));
        let mut index = self.repo.index()?;
        for file in files {
            index.add_path(Path::new(file))?;
        }
        index.write()?;
        Ok(())
    }

    fn commit(&self, msg: &str) -> Result<Oid> {
        debug!("committing changes with msg: {msg}");
        let committer = self.signature()?;
        let mut index = self.repo.index()?;
        let oid = index.write_tree()?;
        let tree = self.repo.find_tree(oid)?;
        let parent_commit = self.repo.head()?.peel_to_commit()?;
        let commit = self.repo.commit(
            Some("HEAD"),
            &committer,
            &committer,
            msg,
            &tree,
            &[&parent_commit],
        )?;
        Ok(commit)
    }

    fn tag_commit(&self, tag: &str, oid: Oid) -> Result<()> {
        let tagger = self.signature()?;
        let commit = self.repo.find_commit(oid)?;
        self.repo
            .tag(tag, commit.as_object(), &tagger, tag, false)?;
        Ok(())
    }

    fn push(&self, remote_name: &str, ref_spec: &str) -> Result<()> {
        info!("pushing {ref_spec} to {remote_name}");
        let config = self.repo.config()?.snapshot()?;
        let user = config.get_str("user.name").unwrap_or("git").to_string();
        let token = self.token.expose_secret().to_string();
        let callbacks = get_auth_callbacks(user, token);
        let mut push_opts = git2::PushOptions::default();
        push_opts.remote_callbacks(callbacks);

        let mut remote = self.repo.find_remote(remote_name)?;
        remote.push(&[ref_spec], Some(&mut push_opts))?;

        Ok(())
    }
}

impl VersionControl for Repository {
    fn last_commit_message(&self) -> Result<String> {
        let commit = self.repo.head()?.peel_to_commit()?;
        Ok(String::from_utf8_lossy(commit.message_bytes()).to_string())
    }

    fn head_parents(&self) -> Result<Vec<String>> {
        let commit = self.repo.head()?.peel_to_commit()?;
        Ok(commit.parent_ids().map(|id| id.to_string()).collect())
    }

    fn changed_files_since(&self, commit: &str) -> Result<Vec<String>> {
        let oid = Oid::from_str(commit)?;
        let tree = self.repo.find_commit(oid)?.tree()?;
        let diff = self.repo.diff_tree_to_workdir_with_index(Some(&tree), None)?;

        let mut files: Vec<String> = vec![];

        for delta in diff.deltas() {
            let paths = [delta.old_file().path(), delta.new_file().path()];
            for path in paths.into_iter().flatten() {
                let path = path.to_string_lossy().to_string();
                if !files.contains(&path) {
                    files.push(path);
                }
            }
        }

        debug!("files changed since {commit}: {files:?}");

        Ok(files)
    }

    fn publish(&self, req: &PublishRequest) -> Result<String> {
        info!(
            "Committing {} back to {}, tagging with \"{}\"",
            req.files.join(" and "),
            req.remote,
            req.tag
        );

        self.stage(&req.files)
            .map_err(|e| ProteusError::publish(PublishStep::Stage, e))?;

        let oid = self
            .commit(&req.message)
            .map_err(|e| ProteusError::publish(PublishStep::Commit, e))?;

        self.tag_commit(&req.tag, oid)
            .map_err(|e| ProteusError::publish(PublishStep::Tag, e))?;

        self.push(&req.remote, &format!("HEAD:refs/heads/{}", req.branch))
            .map_err(|e| ProteusError::publish(PublishStep::PushBranch, e))?;

        self.push(&req.remote, &format!("refs/tags/{0}:refs/tags/{0}", req.tag))
            .map_err(|e| ProteusError::publish(PublishStep::PushTags, e))?;

        Ok(oid.to_string())
    }
}
