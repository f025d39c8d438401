//! Error types for remote byte sources.

use thiserror::Error;

/// Errors that can occur while opening or reading a remote file.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The filename could not be resolved against the base URL.
    #[error("cannot resolve {filename} against {base}")]
    InvalidUrl {
        /// The base URL of the listing.
        base: String,
        /// The filename that failed to resolve.
        filename: String,
    },

    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before the response headers arrived.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Non-success HTTP response.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The body stream failed part way through.
    #[error("read failed: {0}")]
    Read(#[source] std::io::Error),
}

impl SourceError {
    /// Creates a URL resolution error.
    pub fn invalid_url(base: impl Into<String>, filename: impl Into<String>) -> Self {
        Self::InvalidUrl {
            base: base.into(),
            filename: filename.into(),
        }
    }

    /// Creates a network error, promoting reqwest timeouts to [`SourceError::Timeout`].
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Network {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }
}
