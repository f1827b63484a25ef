//! Upload broker: grant request plus direct transfer to object storage.
//!
//! Every staged file goes through two round trips. First the backend is asked
//! for a single-use [`UploadGrant`] keyed only by the file's extension, then
//! the bytes are handed straight to the storage target the grant names. Only
//! the grant's final reference is ever persisted against a resource.

use std::future::Future;

use bytes::Bytes;
use procura_core::{UploadGrant, UploadTarget};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use tracing::{debug, info, instrument, warn};

use crate::error::BrokerFailure;
use crate::{Error, ProcuraClient, failure_message, read_json, send};

/// The two halves of a direct-to-storage upload.
///
/// Implemented by [`ProcuraClient`]; the reconciler is generic over this
/// trait so the ordering logic can run against any broker.
pub trait UploadBroker: Send + Sync {
    /// Ask the backend for a single-use upload target for one file.
    fn request_grant(
        &self,
        extension: &str,
    ) -> impl Future<Output = Result<UploadGrant, Error>> + Send;

    /// Hand `file` to the storage target in `grant`, consuming the grant.
    ///
    /// Returns the grant's final reference on success. Never retries; a failed
    /// transfer needs a fresh grant.
    fn transfer(
        &self,
        grant: UploadGrant,
        file: &Bytes,
        display_name: &str,
    ) -> impl Future<Output = Result<String, Error>> + Send;

    /// Request a grant and transfer in one step.
    fn upload(
        &self,
        extension: &str,
        file: &Bytes,
        display_name: &str,
    ) -> impl Future<Output = Result<String, Error>> + Send {
        async move {
            let grant = self.request_grant(extension).await?;
            self.transfer(grant, file, display_name).await
        }
    }
}

impl UploadBroker for ProcuraClient {
    #[instrument(skip(self))]
    async fn request_grant(&self, extension: &str) -> Result<UploadGrant, Error> {
        let url = self.url("/uploads/upload-url");
        let req = self
            .authorize(self.client.get(&url).query(&[("ext", extension)]))
            .map_err(|e| Error::UploadBroker {
                reason: BrokerFailure::Unauthorized,
                message: e.to_string(),
            })?;
        let response = send(req).await?;

        let status = response.status();
        if !status.is_success() {
            let reason = if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
                BrokerFailure::Unauthorized
            } else {
                BrokerFailure::Server
            };
            let message = failure_message(response, "Failed to get upload URL").await;
            warn!(%status, %reason, "upload grant refused");
            return Err(Error::UploadBroker { reason, message });
        }

        let grant: UploadGrant = read_json(response).await.map_err(|e| Error::UploadBroker {
            reason: BrokerFailure::MalformedResponse,
            message: e.to_string(),
        })?;
        if !grant.is_usable() {
            return Err(Error::UploadBroker {
                reason: BrokerFailure::MalformedResponse,
                message: "No presigned URL received from server".into(),
            });
        }

        debug!(target_url = grant.target.url(), "upload grant issued");
        Ok(grant)
    }

    #[instrument(skip(self, grant, file), fields(bytes = file.len()))]
    async fn transfer(
        &self,
        grant: UploadGrant,
        file: &Bytes,
        display_name: &str,
    ) -> Result<String, Error> {
        let UploadGrant {
            target,
            final_reference,
        } = grant;

        // Presigned targets carry their own authorization; no bearer token.
        let req = match target {
            UploadTarget::Form { url, fields } => {
                let mut form = Form::new();
                for (key, value) in fields {
                    form = form.text(key, value);
                }
                let part = Part::stream(file.clone()).file_name(display_name.to_string());
                form = form.part("file", part);
                self.client.post(url).multipart(form)
            }
            UploadTarget::Put(url) => self.client.put(url).body(file.clone()),
        };

        let response = send(req).await?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .ok()
                .filter(|body| !body.trim().is_empty())
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
            warn!(%status, "storage rejected transfer");
            return Err(Error::Transfer {
                status: status.as_u16(),
                message,
            });
        }

        info!(reference = %final_reference, "file uploaded to storage");
        Ok(final_reference)
    }
}
