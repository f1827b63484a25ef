use std::path::Path;

use procura_core::Attachment;
use tracing::debug;

use crate::OpsError;

/// Read a local file into a staged attachment named after the file.
pub async fn load_staged(path: impl AsRef<Path>) -> Result<Attachment, OpsError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|source| OpsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let display_name = path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    );
    debug!(path = %path.display(), bytes = bytes.len(), "staged local file");
    Ok(Attachment::staged(bytes, display_name))
}
