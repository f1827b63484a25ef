//! Attachment sequences for resources that carry uploaded references.
//!
//! A resource's pictures are edited as one ordered sequence that mixes
//! references the backend already knows about with local files that have not
//! been uploaded yet. [`AttachmentSet`] owns that sequence together with the
//! references the user explicitly removed during the edit session.

use bytes::Bytes;

/// Extension used when a display name carries no usable extension.
pub const DEFAULT_EXTENSION: &str = "jpg";

/// One entry in a resource's ordered attachment sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    /// A reference already stored and known to the backend.
    Persisted {
        /// The reference URL as returned by the backend.
        url: String,
    },
    /// A local file selected for upload but not yet transferred.
    Staged {
        /// Raw file content.
        file: Bytes,
        /// Original file name, used for the extension and the multipart filename.
        display_name: String,
    },
}

impl Attachment {
    /// Create a persisted attachment from an existing reference.
    pub fn persisted(url: impl Into<String>) -> Self {
        Self::Persisted { url: url.into() }
    }

    /// Create a staged attachment from local file content.
    pub fn staged(file: impl Into<Bytes>, display_name: impl Into<String>) -> Self {
        Self::Staged {
            file: file.into(),
            display_name: display_name.into(),
        }
    }

    /// Returns `true` if this attachment still needs to be uploaded.
    pub fn is_staged(&self) -> bool {
        matches!(self, Self::Staged { .. })
    }

    /// Returns the reference URL for persisted attachments.
    pub fn persisted_url(&self) -> Option<&str> {
        match self {
            Self::Persisted { url } => Some(url),
            Self::Staged { .. } => None,
        }
    }

    /// Returns the extension the upload grant is requested for.
    ///
    /// Persisted attachments have nothing to upload and return `None`.
    pub fn upload_extension(&self) -> Option<String> {
        match self {
            Self::Persisted { .. } => None,
            Self::Staged { display_name, .. } => Some(file_extension(display_name)),
        }
    }
}

/// Derive the upload extension from a file's display name.
///
/// Takes the text after the last `.`, case preserved. Names without a dot, or
/// ending in one, fall back to [`DEFAULT_EXTENSION`].
pub fn file_extension(display_name: &str) -> String {
    match display_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext.to_string(),
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

/// An attachment edit session.
///
/// Holds the active ordered sequence and the pending-removal set. The two are
/// kept disjoint: removing a persisted attachment moves its reference into the
/// removal set, removing a staged one just drops it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentSet {
    attachments: Vec<Attachment>,
    pending_removals: Vec<String>,
}

impl AttachmentSet {
    /// Create an empty edit session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an edit session from a resource's current references.
    pub fn from_persisted<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            attachments: urls.into_iter().map(Attachment::persisted).collect(),
            pending_removals: Vec::new(),
        }
    }

    /// Append a local file to the end of the sequence.
    pub fn stage(&mut self, file: impl Into<Bytes>, display_name: impl Into<String>) {
        self.attachments.push(Attachment::staged(file, display_name));
    }

    /// Append an already-built attachment to the end of the sequence.
    pub fn push(&mut self, attachment: Attachment) {
        if let Attachment::Persisted { url } = &attachment {
            self.pending_removals.retain(|r| r != url);
        }
        self.attachments.push(attachment);
    }

    /// Remove the attachment at `index`.
    ///
    /// Returns the removed entry, or `None` if the index is out of bounds.
    pub fn remove(&mut self, index: usize) -> Option<Attachment> {
        if index >= self.attachments.len() {
            return None;
        }
        let removed = self.attachments.remove(index);
        if let Attachment::Persisted { url } = &removed {
            let still_active = self
                .attachments
                .iter()
                .any(|a| a.persisted_url() == Some(url.as_str()));
            if !still_active && !self.pending_removals.contains(url) {
                self.pending_removals.push(url.clone());
            }
        }
        Some(removed)
    }

    /// Remove the first persisted attachment with the given reference.
    ///
    /// Returns `false` if no such reference is in the active sequence.
    pub fn remove_reference(&mut self, url: &str) -> bool {
        let position = self
            .attachments
            .iter()
            .position(|a| a.persisted_url() == Some(url));
        match position {
            Some(index) => self.remove(index).is_some(),
            None => false,
        }
    }

    /// The active ordered sequence.
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// References explicitly removed during this session, in removal order.
    pub fn pending_removals(&self) -> &[String] {
        &self.pending_removals
    }

    /// Number of entries that still need uploading.
    pub fn staged_count(&self) -> usize {
        self.attachments.iter().filter(|a| a.is_staged()).count()
    }

    /// Number of entries in the active sequence.
    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    /// Returns `true` if the active sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }

    /// Split into the active sequence and the removal set.
    pub fn into_parts(self) -> (Vec<Attachment>, Vec<String>) {
        (self.attachments, self.pending_removals)
    }
}
