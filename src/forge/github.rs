//! Implements the Forge trait for GitHub and GitHub Enterprise
use async_trait::async_trait;
use chrono::DateTime;
use log::*;
use reqwest::{
    Client, StatusCode, Url,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue},
};
use secrecy::ExposeSecret;

use crate::{
    Result,
    error::ProteusError,
    forge::{
        config::RemoteConfig,
        request::{CommentBody, CommentRequest, PullRequestDetails},
        traits::Forge,
    },
};

mod types;

use types::{GithubErrorMessage, GithubPullRequest};

const USER_AGENT: &str = concat!("proteus/", env!("CARGO_PKG_VERSION"));

/// GitHub forge implementation using reqwest against the v3 REST API.
pub struct Github {
    config: RemoteConfig,
    base_url: Url,
    client: Client,
    has_token: bool,
}

impl Github {
    /// Create client with token authentication. TLS verification and the
    /// request timeout come from the remote config.
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let token = config.token.expose_secret();
        let has_token = !token.is_empty();

        let mut headers = HeaderMap::new();

        headers.append(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );

        if has_token {
            let mut token_value =
                HeaderValue::from_str(format!("token {}", token).as_str())?;
            token_value.set_sensitive(true);
            headers.append(AUTHORIZATION, token_value);
        }

        if config.accept_invalid_certs {
            warn!("TLS certificate verification is disabled for forge requests");
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        let base_url = Url::parse(&format!(
            "{}/repos/{}/{}/",
            config.api_url.as_str().trim_end_matches('/'),
            config.owner,
            config.repo
        ))?;

        Ok(Self {
            config,
            base_url,
            client,
            has_token,
        })
    }

    fn unauthorized(&self) -> ProteusError {
        ProteusError::Unauthorized {
            owner: self.config.owner.clone(),
            repo: self.config.repo.clone(),
        }
    }

    fn comment_failed(
        &self,
        req: &CommentRequest,
        reason: impl Into<String>,
    ) -> ProteusError {
        ProteusError::CommentPostFailed {
            owner: self.config.owner.clone(),
            repo: self.config.repo.clone(),
            pr_number: req.pr_number,
            reason: reason.into(),
            text: req.body.clone(),
        }
    }
}

fn into_details(
    number: u64,
    pr: GithubPullRequest,
) -> Result<PullRequestDetails> {
    let created_at = DateTime::parse_from_rfc3339(&pr.created_at)?;
    let comments_url =
        format!("{}/comments", pr.links.issue.href.trim_end_matches('/'));

    Ok(PullRequestDetails {
        number,
        title: pr.title,
        body: pr.body.unwrap_or_default(),
        created_at,
        comments_url,
        base_ref: pr.base.name,
    })
}

#[async_trait]
impl Forge for Github {
    fn remote_config(&self) -> RemoteConfig {
        self.config.clone()
    }

    async fn get_pull_request(
        &self,
        number: u64,
    ) -> Result<PullRequestDetails> {
        if !self.has_token {
            return Err(self.unauthorized());
        }

        let url = self.base_url.join(&format!("pulls/{number}"))?;
        debug!("fetching pull request: {url}");

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(self.unauthorized());
        }

        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GithubErrorMessage>(&raw)
                .map(|m| m.message)
                .unwrap_or(raw);
            return Err(ProteusError::ForgeError {
                status: Some(status.as_u16()),
                message,
                url: url.to_string(),
            });
        }

        let pr: GithubPullRequest = response.json().await?;

        into_details(number, pr)
    }

    async fn post_comment(&self, req: CommentRequest) -> Result<()> {
        let url = Url::parse(&req.comments_url).map_err(|e| {
            self.comment_failed(&req, format!("invalid comments url: {e}"))
        })?;
        debug!("posting comment to pull request #{}: {url}", req.pr_number);

        let response = self
            .client
            .post(url)
            .json(&CommentBody { body: &req.body })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProteusError::from(e)
                } else {
                    self.comment_failed(&req, e.to_string())
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            return Err(
                self.comment_failed(&req, format!("status {}", status.as_u16()))
            );
        }

        Ok(())
    }
}
