//! Remote byte sources feeding the download workers.
//!
//! - [`RemoteSource`] - Async trait opening one file's byte stream by name
//! - [`HttpSource`] - Resolves names against a listing URL and streams them over HTTP
//! - [`ChunkedSource`] - Turns any reader into fixed-size chunks

mod chunked;
mod error;
mod http;

pub use chunked::ChunkedSource;
pub use error::SourceError;
pub use http::{HttpSource, build_client};

use async_trait::async_trait;
use tokio::io::AsyncRead;

/// Owned byte stream for a single remote file.
pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// Opens the byte stream of a remote file.
///
/// Implementations must be shareable across worker tasks; each call to
/// [`open`](RemoteSource::open) returns an independent stream.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Opens `filename` for reading from its first byte.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the file cannot be located or requested.
    async fn open(&self, filename: &str) -> Result<BoxedReader, SourceError>;
}
