use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default bound on every forge request.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// HTTP settings for the forge client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ForgeConfig {
    /// Skip TLS certificate verification. On by default because the forge
    /// is usually a private instance with an internal certificate authority.
    pub accept_invalid_certs: bool,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            accept_invalid_certs: true,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}
