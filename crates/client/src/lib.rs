//! Procura HTTP Client
//!
//! A native Rust client for the supplier/consumer marketplace backend behind
//! the Procura admin dashboard.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use procura_client::{CatalogSync, ProcuraClient, StaticCredentials};
//! use procura_core::{AttachmentSet, CatalogItemFields};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), procura_client::Error> {
//!     let client = ProcuraClient::builder("http://127.0.0.1:8000")
//!         .credentials(Arc::new(StaticCredentials::new("access-token")))
//!         .build()?;
//!
//!     let mut catalog = CatalogSync::new(client);
//!     catalog.fetch().await?;
//!
//!     let mut pictures = AttachmentSet::new();
//!     pictures.stage(std::fs::read("flour.png").unwrap(), "flour.png");
//!     let item = catalog
//!         .create(CatalogItemFields::new("Flour"), pictures)
//!         .await?;
//!     println!("created {:?} with {} pictures", item.product_id(), item.picture_url.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - Two-phase picture uploads (upload grant, then direct transfer to storage)
//! - Ordered reconciliation of existing references with newly staged files
//! - Catalog, staff, linking, company and city endpoints
//! - Collection state that is always refetched after a mutation
//! - Injected credential providers instead of ambient session state

mod auth;
mod catalog;
mod cities;
mod company;
mod credentials;
mod error;
mod linkings;
pub mod reconcile;
mod state;
pub mod uploads;
mod users;

pub use catalog::CatalogSync;
pub use cities::CityCache;
pub use credentials::{CredentialProvider, SessionStore, StaticCredentials};
pub use error::{BrokerFailure, Error};
pub use linkings::LinkingSync;
pub use reconcile::{ReconciledAttachments, reconcile};
pub use state::CollectionState;
pub use uploads::UploadBroker;
pub use users::UserSync;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Characters escaped in path segments (RFC 3986 unreserved characters pass through).
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// HTTP client for the marketplace backend.
///
/// Cheap to clone; clones share the connection pool and credential provider.
#[derive(Clone)]
pub struct ProcuraClient {
    client: Client,
    base_url: String,
    credentials: Option<Arc<dyn CredentialProvider>>,
}

impl fmt::Debug for ProcuraClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcuraClient")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for configuring a [`ProcuraClient`].
pub struct ProcuraClientBuilder {
    base_url: String,
    timeout: Duration,
    credentials: Option<Arc<dyn CredentialProvider>>,
    client: Option<Client>,
}

impl ProcuraClientBuilder {
    /// Create a new builder with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            credentials: None,
            client: None,
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the provider consulted for the bearer token on each request.
    #[must_use]
    pub fn credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Use a custom reqwest Client.
    ///
    /// Useful for configuring TLS, proxies, or other advanced settings.
    #[must_use]
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<ProcuraClient, Error> {
        if self.base_url.is_empty() {
            return Err(Error::Configuration("base URL must not be empty".into()));
        }
        let client = match self.client {
            Some(c) => c,
            None => Client::builder()
                .timeout(self.timeout)
                .build()
                .map_err(|e| Error::Configuration(e.to_string()))?,
        };

        Ok(ProcuraClient {
            client,
            base_url: self.base_url,
            credentials: self.credentials,
        })
    }
}

impl ProcuraClient {
    /// Create a builder for advanced configuration.
    pub fn builder(base_url: impl Into<String>) -> ProcuraClientBuilder {
        ProcuraClientBuilder::new(base_url)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Attach the bearer token, failing if the provider has none.
    fn authorize(&self, req: RequestBuilder) -> Result<RequestBuilder, Error> {
        let token = self
            .credentials
            .as_ref()
            .and_then(|c| c.access_token())
            .ok_or_else(|| Error::Auth("no access token available, sign in first".into()))?;
        Ok(req.bearer_auth(token))
    }
}

/// Percent-encode a single path segment.
pub(crate) fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

/// Send a request, mapping transport failures to [`Error::Network`].
pub(crate) async fn send(req: RequestBuilder) -> Result<Response, Error> {
    req.send().await.map_err(|e| Error::Network(e.to_string()))
}

/// Decode a successful JSON response.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, Error> {
    response
        .json::<T>()
        .await
        .map_err(|e| Error::Deserialization(e.to_string()))
}

/// Pull a list out of a wrapper object like `{"products": [...]}`.
///
/// A missing or non-array field reads as an empty list.
pub(crate) fn list_field<T: DeserializeOwned>(
    mut body: serde_json::Value,
    field: &str,
) -> Result<Vec<T>, Error> {
    match body.get_mut(field).map(serde_json::Value::take) {
        Some(list @ serde_json::Value::Array(_)) => {
            serde_json::from_value(list).map_err(|e| Error::Deserialization(e.to_string()))
        }
        _ => Ok(Vec::new()),
    }
}

/// How a non-success status on a backend call is reported.
#[derive(Debug, Clone, Copy)]
pub(crate) enum FailureKind {
    /// Reads, deletes and other non-upsert calls.
    Request,
    /// Resource create or update.
    Upsert,
}

/// Pass successful responses through, turn anything else into an error.
///
/// 401 and 403 become [`Error::Auth`]; other statuses become
/// [`Error::Upsert`] or [`Error::Http`] depending on `kind`.
pub(crate) async fn ensure_success(
    response: Response,
    context: &str,
    kind: FailureKind,
) -> Result<Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = failure_message(response, context).await;
    Err(match (status, kind) {
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => Error::Auth(message),
        (_, FailureKind::Upsert) => Error::Upsert {
            status: status.as_u16(),
            message,
        },
        (_, FailureKind::Request) => Error::Http {
            status: status.as_u16(),
            message,
        },
    })
}

/// Structured error body returned by the backend.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

/// Extract a human-readable message from a failed response.
///
/// Prefers `detail`, then `message`; falls back to `"<context>: <status>"`.
pub(crate) async fn failure_message(response: Response, context: &str) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    message_from_body(&body).unwrap_or_else(|| format!("{context}: {status}"))
}

fn message_from_body(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let detail = parsed.detail.and_then(|detail| match detail {
        serde_json::Value::String(s) => Some(s),
        // Validation errors arrive as a list of `{loc, msg, type}` objects.
        serde_json::Value::Array(items) => {
            let msgs: Vec<String> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .map(ToString::to_string)
                .collect();
            if msgs.is_empty() {
                None
            } else {
                Some(msgs.join("; "))
            }
        }
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    });
    detail
        .or(parsed.message)
        .filter(|m| !m.trim().is_empty())
}
