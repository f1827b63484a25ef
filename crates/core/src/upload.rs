use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Where and how a single file's bytes are handed to object storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UploadTarget {
    /// Presigned POST: every opaque form field must be sent ahead of the file part.
    Form {
        /// Storage endpoint receiving the multipart form.
        url: String,
        /// Opaque form fields required by the storage service.
        #[serde(default)]
        fields: BTreeMap<String, String>,
    },
    /// Presigned PUT of the raw bytes.
    Put(String),
}

impl UploadTarget {
    /// The storage URL the bytes are sent to.
    pub fn url(&self) -> &str {
        match self {
            Self::Form { url, .. } | Self::Put(url) => url,
        }
    }
}

/// A short-lived, single-use upload authorization issued by the backend.
///
/// Obtained right before a staged file's transfer and consumed by it. Grants
/// are never stored or shared between files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadGrant {
    /// Storage destination for the transfer.
    #[serde(rename = "put_url")]
    pub target: UploadTarget,
    /// The reference to persist against the resource once the transfer succeeds.
    #[serde(rename = "finalurl")]
    pub final_reference: String,
}

impl UploadGrant {
    /// Returns `true` if the grant names both a storage URL and a final reference.
    pub fn is_usable(&self) -> bool {
        !self.target.url().trim().is_empty() && !self.final_reference.trim().is_empty()
    }
}
