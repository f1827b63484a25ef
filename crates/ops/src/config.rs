//! Configuration for the operations layer.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::OpsError;

/// Endpoint used when neither the environment nor a config file names one.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000";

/// Configuration for connecting to the marketplace backend.
#[derive(Clone)]
pub struct OpsConfig {
    /// Backend base URL (e.g. `http://127.0.0.1:8000`).
    pub endpoint: String,
    /// Bearer token for authenticated calls.
    pub access_token: Option<String>,
    /// Request timeout.
    pub timeout: Option<Duration>,
}

/// On-disk shape of a configuration file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    endpoint: Option<String>,
    access_token: Option<String>,
    timeout_secs: Option<u64>,
}

impl OpsConfig {
    /// Create a new configuration with defaults.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_token: None,
            timeout: None,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Reads:
    /// - `PROCURA_ENDPOINT` (defaults to `http://127.0.0.1:8000`)
    /// - `PROCURA_ACCESS_TOKEN` (optional)
    /// - `PROCURA_TIMEOUT_SECS` (optional, default 30)
    pub fn from_env() -> Self {
        let endpoint =
            std::env::var("PROCURA_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let access_token = std::env::var("PROCURA_ACCESS_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());
        let timeout = std::env::var("PROCURA_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs);

        Self {
            endpoint,
            access_token,
            timeout,
        }
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, OpsError> {
        let file: FileConfig =
            toml::from_str(text).map_err(|e| OpsError::Configuration(e.to_string()))?;
        Ok(Self {
            endpoint: file
                .endpoint
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            access_token: file.access_token.filter(|t| !t.is_empty()),
            timeout: file.timeout_secs.map(Duration::from_secs),
        })
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, OpsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| OpsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|e| match e {
            OpsError::Configuration(msg) => {
                OpsError::Configuration(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Override the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Override the access token.
    #[must_use]
    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    /// Override the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for OpsConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl fmt::Debug for OpsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpsConfig")
            .field("endpoint", &self.endpoint)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout", &self.timeout)
            .finish()
    }
}
