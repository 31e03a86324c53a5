//! CLI argument parsing and forge remote configuration.
use clap::Parser;
use git_url_parse::GitUrl;
use secrecy::SecretString;
use std::{env, path::PathBuf, time::Duration};
use url::Url;

use crate::{
    Result,
    config::{DEFAULT_CONFIG_FILE, forge::ForgeConfig},
    error::ProteusError,
    forge::config::RemoteConfig,
};

const PUBLIC_GITHUB_HOST: &str = "github.com";
const PUBLIC_GITHUB_API: &str = "https://api.github.com";

/// Bump VERSION and CHANGELOG.md from pull request descriptions.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(long)]
    /// Repository web URL (https://git.example.com/owner/repo).
    pub repo: String,

    #[arg(long)]
    /// Number of the pull request under test. Omit on merge builds.
    pub pr: Option<String>,

    #[arg(long, default_value = "")]
    /// Forge access token. Falls back to GITHUB_TOKEN env var.
    pub token: String,

    #[arg(long)]
    /// REST API root. Derived from the repo URL when omitted.
    pub api_url: Option<String>,

    #[arg(long, default_value_t = false)]
    /// Verify the forge's TLS certificate.
    pub verify_tls: bool,

    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    /// Path to the configuration file.
    pub config: PathBuf,

    #[arg(long, default_value = ".")]
    /// Repository checkout to operate on.
    pub workdir: PathBuf,

    #[arg(long, default_value_t = false)]
    /// Enable debug logging.
    pub debug: bool,
}

impl Args {
    /// Configure the forge connection from CLI arguments and the `[forge]`
    /// section of the config file.
    pub fn get_remote(&self, forge: &ForgeConfig) -> Result<RemoteConfig> {
        let parsed = GitUrl::parse(&self.repo)?;

        validate_scheme(parsed.scheme)?;

        let token = resolve_token(
            &self.token,
            parsed.token.clone(),
            env::var("GITHUB_TOKEN").ok(),
        );

        let host = parsed.host.clone().ok_or_else(|| {
            ProteusError::InvalidArgument(format!(
                "unable to parse host from repo url: {}",
                self.repo
            ))
        })?;

        let owner = parsed.owner.clone().ok_or_else(|| {
            ProteusError::InvalidArgument(format!(
                "unable to parse owner from repo url: {}",
                self.repo
            ))
        })?;

        let scheme = parsed.scheme.to_string();

        let api_url = match &self.api_url {
            Some(api_url) => Url::parse(api_url)?,
            None => default_api_url(&scheme, &host, parsed.port)?,
        };

        Ok(RemoteConfig {
            host,
            port: parsed.port,
            scheme,
            owner,
            repo: parsed.name,
            api_url,
            token: SecretString::from(token),
            accept_invalid_certs: forge.accept_invalid_certs
                && !self.verify_tls,
            request_timeout: Duration::from_secs(forge.request_timeout_secs),
        })
    }
}

/// Validate repository URL uses HTTP or HTTPS scheme.
fn validate_scheme(scheme: git_url_parse::Scheme) -> Result<()> {
    match scheme {
        git_url_parse::Scheme::Http => Ok(()),
        git_url_parse::Scheme::Https => Ok(()),
        _ => Err(ProteusError::InvalidArgument(
            "only http and https schemes are supported for repo urls".into(),
        )),
    }
}

/// First non-empty of: explicit flag, token embedded in the URL, env var.
fn resolve_token(
    flag: &str,
    embedded: Option<String>,
    env_token: Option<String>,
) -> String {
    if !flag.is_empty() {
        return flag.to_string();
    }

    embedded
        .filter(|t| !t.is_empty())
        .or(env_token.filter(|t| !t.is_empty()))
        .unwrap_or_default()
}

/// The public host has a dedicated API host; enterprise installs serve the
/// API under `/api/v3` on the web host.
fn default_api_url(scheme: &str, host: &str, port: Option<u16>) -> Result<Url> {
    if host == PUBLIC_GITHUB_HOST {
        return Ok(Url::parse(PUBLIC_GITHUB_API)?);
    }

    let base = match port {
        Some(port) => format!("{scheme}://{host}:{port}"),
        None => format!("{scheme}://{host}"),
    };

    Ok(Url::parse(&format!("{base}/api/v3"))?)
}
