//! Error type for a whole run.

use std::path::PathBuf;

use thiserror::Error;

use crate::listing::ListingError;
use crate::source::SourceError;

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum HuntError {
    /// The configuration cannot drive a run.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with it.
        reason: String,
    },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// The directory listing could not be fetched.
    #[error(transparent)]
    Listing(#[from] ListingError),

    /// The destination directory could not be created.
    #[error("cannot prepare destination directory {path}: {source}")]
    Destination {
        /// The destination directory.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A remote file could not be opened or read.
    #[error("failed to download {filename}: {source}")]
    Source {
        /// The file being downloaded.
        filename: String,
        /// What went wrong on the remote side.
        #[source]
        source: SourceError,
    },

    /// A local file could not be created or written.
    #[error("IO error writing to {path}: {source}")]
    Sink {
        /// The local file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A disqualified file could not be removed.
    #[error("failed to remove {path}: {source}")]
    Cleanup {
        /// The local file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A download task panicked.
    #[error("download worker panicked: {0}")]
    WorkerPanicked(String),

    /// Every report sender went away while downloads were still unaccounted for.
    #[error("progress channel closed with {outstanding} downloads unaccounted for")]
    ChannelClosed {
        /// Files whose final report never arrived.
        outstanding: usize,
    },
}

impl HuntError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Creates a source error for `filename`.
    pub fn download(filename: impl Into<String>, source: SourceError) -> Self {
        Self::Source {
            filename: filename.into(),
            source,
        }
    }

    /// Creates a local write error.
    pub fn sink(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Sink {
            path: path.into(),
            source,
        }
    }

    /// Creates a removal error.
    pub fn cleanup(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Cleanup {
            path: path.into(),
            source,
        }
    }
}
