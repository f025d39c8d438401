//! HTTP-backed remote source.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use reqwest::Client;
use tokio_util::io::StreamReader;
use tracing::{debug, instrument};
use url::Url;

use super::{BoxedReader, RemoteSource, SourceError};
use crate::user_agent;

/// Builds the HTTP client used for the listing and every file download.
///
/// # Errors
///
/// Returns the builder's error if the TLS backend cannot be initialised.
pub fn build_client(
    connect_timeout: Duration,
    read_timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(read_timeout)
        .gzip(true)
        .user_agent(user_agent::default_user_agent())
        .build()
}

/// Streams files that live next to a directory listing.
///
/// Filenames are resolved relative to the listing URL, so a listing served at
/// `http://host/files/` yields `http://host/files/<name>`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base: Url,
}

impl HttpSource {
    /// Creates a source resolving filenames against `base`.
    #[must_use]
    pub fn new(client: Client, base: Url) -> Self {
        Self { client, base }
    }

    /// Resolves `filename` to the URL it is downloaded from.
    ///
    /// The name is percent-encoded as a single path segment, so names holding
    /// `?`, `#` or spaces still address the file and not a query or fragment.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidUrl`] if the joined URL cannot be built.
    pub fn resolve(&self, filename: &str) -> Result<Url, SourceError> {
        let segment = urlencoding::encode(filename);
        self.base
            .join(&segment)
            .map_err(|_| SourceError::invalid_url(self.base.as_str(), filename))
    }
}

#[async_trait]
impl RemoteSource for HttpSource {
    #[instrument(skip(self))]
    async fn open(&self, filename: &str) -> Result<BoxedReader, SourceError> {
        let url = self.resolve(filename)?;
        debug!(url = %url, "requesting file");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| SourceError::network(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::http_status(url.as_str(), status.as_u16()));
        }

        let body = response.bytes_stream().map_err(std::io::Error::other);
        Ok(Box::new(StreamReader::new(Box::pin(body))))
    }
}
