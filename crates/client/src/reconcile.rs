//! Attachment reconciliation.
//!
//! Turns an ordered mix of persisted references and staged files into the
//! final ordered reference list, uploading staged files one at a time.

use std::collections::HashSet;

use procura_core::{Attachment, file_extension};
use tracing::{debug, instrument, warn};

use crate::Error;
use crate::uploads::UploadBroker;

/// The outcome of a successful reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciledAttachments {
    /// Final references, position-for-position with the input sequence.
    pub references: Vec<String>,
    /// Removal set to send along with the upsert, minus anything still active.
    pub removed: Vec<String>,
    /// How many staged files were uploaded.
    pub uploaded: usize,
}

/// Reconcile `attachments` against `removals`.
///
/// Persisted entries pass through unchanged. Each staged entry gets its own
/// grant and transfer, in order, and its final reference takes the staged
/// entry's position. The first failure aborts: files uploaded before it stay
/// in storage, and no reference list is returned.
///
/// A reference that is both active and in `removals` stays active and is
/// dropped from the returned removal set.
#[instrument(skip_all, fields(attachments = attachments.len(), removals = removals.len()))]
pub async fn reconcile<B: UploadBroker>(
    broker: &B,
    attachments: &[Attachment],
    removals: &[String],
) -> Result<ReconciledAttachments, Error> {
    let mut references = Vec::with_capacity(attachments.len());
    let mut uploaded = 0;

    for (position, attachment) in attachments.iter().enumerate() {
        match attachment {
            Attachment::Persisted { url } => references.push(url.clone()),
            Attachment::Staged { file, display_name } => {
                let extension = file_extension(display_name);
                debug!(position, %extension, "uploading staged attachment");
                let reference = broker
                    .upload(&extension, file, display_name)
                    .await
                    .map_err(|e| Error::reconciliation(position, e))?;
                references.push(reference);
                uploaded += 1;
            }
        }
    }

    let active: HashSet<&str> = references.iter().map(String::as_str).collect();
    let mut removed: Vec<String> = Vec::with_capacity(removals.len());
    for reference in removals {
        if active.contains(reference.as_str()) {
            warn!(%reference, "reference marked for removal is still active; keeping it");
            continue;
        }
        if !removed.contains(reference) {
            removed.push(reference.clone());
        }
    }

    Ok(ReconciledAttachments {
        references,
        removed,
        uploaded,
    })
}
