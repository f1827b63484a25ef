//! Error types for the Procura client.

use std::fmt;

use thiserror::Error;

/// Why an upload grant could not be obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerFailure {
    /// The backend rejected the caller's credential.
    Unauthorized,
    /// The backend answered with a non-success status.
    Server,
    /// The response did not contain a usable upload target.
    MalformedResponse,
}

impl fmt::Display for BrokerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unauthorized => "unauthorized",
            Self::Server => "server",
            Self::MalformedResponse => "malformed-response",
        })
    }
}

/// Errors that can occur when using the Procura client.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or rejected credential.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Transport-level failure (connection refused, DNS, timeout).
    #[error("failed to connect to server: {0}")]
    Network(String),

    /// The upload grant request failed.
    #[error("upload grant failed ({reason}): {message}")]
    UploadBroker {
        /// Failure category.
        reason: BrokerFailure,
        /// Human-readable message.
        message: String,
    },

    /// Object storage rejected the byte transfer.
    #[error("upload to storage failed: HTTP {status}: {message}")]
    Transfer {
        /// HTTP status code returned by storage.
        status: u16,
        /// Human-readable message.
        message: String,
    },

    /// The backend rejected a create or update.
    #[error("{message}")]
    Upsert {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the backend's error body.
        message: String,
    },

    /// A read or delete returned a non-success status.
    #[error("{message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the backend's error body.
        message: String,
    },

    /// A staged attachment could not be uploaded; nothing was persisted.
    #[error("attachment {position} could not be uploaded: {source}")]
    Reconciliation {
        /// Zero-based position of the failing attachment in the sequence.
        position: usize,
        /// The first failure's cause.
        #[source]
        source: Box<Error>,
    },

    /// Response deserialization error.
    #[error("failed to deserialize response: {0}")]
    Deserialization(String),

    /// Client configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Wrap a failure that happened while reconciling the attachment at `position`.
    pub fn reconciliation(position: usize, source: Error) -> Self {
        Self::Reconciliation {
            position,
            source: Box::new(source),
        }
    }

    /// Returns `true` if this is a transport-level failure.
    pub fn is_network_error(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Reconciliation { source, .. } => source.is_network_error(),
            _ => false,
        }
    }

    /// Returns `true` if the credential was missing or rejected.
    pub fn is_auth_error(&self) -> bool {
        match self {
            Self::Auth(_) => true,
            Self::UploadBroker { reason, .. } => *reason == BrokerFailure::Unauthorized,
            Self::Reconciliation { source, .. } => source.is_auth_error(),
            _ => false,
        }
    }

    /// HTTP status code, if the failure came from an HTTP response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transfer { status, .. } | Self::Upsert { status, .. } | Self::Http { status, .. } => {
                Some(*status)
            }
            Self::Reconciliation { source, .. } => source.status(),
            _ => None,
        }
    }
}
