//! Error types for the operations layer.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the operations layer.
#[derive(Debug, Error)]
pub enum OpsError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A named resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A local file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the underlying HTTP client.
    #[error(transparent)]
    Client(#[from] procura_client::Error),
}
