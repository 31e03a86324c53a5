//! Configuration for forge connections.
use secrecy::SecretString;
use std::time::Duration;
use url::Url;

use crate::config::forge::DEFAULT_REQUEST_TIMEOUT_SECS;

/// Remote repository connection configuration for authenticating and
/// interacting with the forge.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Remote forge host (e.g., "github.com").
    pub host: String,
    /// Remote forge port for self-hosted instances.
    pub port: Option<u16>,
    /// URL scheme (http or https).
    pub scheme: String,
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// REST API root (e.g. "https://git.example.com/api/v3").
    pub api_url: Url,
    /// Access token for authentication. May be empty.
    pub token: SecretString,
    /// Skip TLS certificate verification.
    pub accept_invalid_certs: bool,
    /// Bound on every request.
    pub request_timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: "".to_string(),
            port: None,
            scheme: "https".to_string(),
            owner: "".to_string(),
            repo: "".to_string(),
            api_url: Url::parse("https://api.github.com")
                .expect("static url is valid"),
            token: SecretString::from("".to_string()),
            accept_invalid_certs: true,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl RemoteConfig {
    /// Base URL of the forge web interface.
    pub fn web_base_url(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{}", self.scheme, self.host, port),
            None => format!("{}://{}", self.scheme, self.host),
        }
    }

    /// Web link to a pull request, used in changelog entries.
    pub fn pull_request_link(&self, number: u64) -> String {
        format!(
            "{}/{}/{}/pull/{}",
            self.web_base_url(),
            self.owner,
            self.repo,
            number
        )
    }
}
