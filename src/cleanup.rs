//! Local file handling: creating download sinks and removing losers.

use std::io::ErrorKind;
use std::path::Path;

use tokio::fs::File;
use tracing::{debug, instrument};

use crate::hunt::HuntError;

/// Creates (or truncates) the local file a download streams into.
///
/// # Errors
///
/// Returns [`HuntError::Sink`] if the file cannot be created.
pub async fn create_sink(path: &Path) -> Result<File, HuntError> {
    File::create(path)
        .await
        .map_err(|e| HuntError::sink(path, e))
}

/// Removes one file, treating an already absent file as done.
///
/// Returns `true` if a file was actually deleted.
///
/// # Errors
///
/// Returns [`HuntError::Cleanup`] for any failure other than `NotFound`.
pub async fn remove_file(path: &Path) -> Result<bool, HuntError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "removed file");
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(HuntError::cleanup(path, e)),
    }
}

/// Removes every named file from `dir`.
///
/// Safe to call repeatedly with the same names: files that are already gone
/// are skipped. Returns the number of files deleted by this call.
///
/// # Errors
///
/// Returns the first [`HuntError::Cleanup`] encountered; files after it are
/// left untouched.
#[instrument(skip(names), fields(dir = %dir.display()))]
pub async fn remove_files<I, S>(dir: &Path, names: I) -> Result<usize, HuntError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut removed = 0;
    for name in names {
        if remove_file(&dir.join(name.as_ref())).await? {
            removed += 1;
        }
    }
    Ok(removed)
}
