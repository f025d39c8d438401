//! One download task: stream, scan, write, report.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace};

use super::HuntError;
use super::progress::{FileId, Progress, Report};
use crate::cleanup::create_sink;
use crate::scan::find_marker;
use crate::source::{ChunkedSource, RemoteSource, SourceError};

/// Everything a worker needs, moved into its task.
pub(crate) struct Worker {
    pub(crate) file: FileId,
    pub(crate) filename: String,
    pub(crate) path: PathBuf,
    pub(crate) source: Arc<dyn RemoteSource>,
    pub(crate) chunk_size: usize,
    pub(crate) marker: u8,
    pub(crate) reports: mpsc::Sender<Report>,
    pub(crate) cancel: CancellationToken,
}

impl Worker {
    /// Runs the download and always finishes with exactly one final report:
    /// a `done` progress report or a [`Report::Failed`].
    #[instrument(skip(self), fields(file = %self.filename))]
    pub(crate) async fn run(self) {
        let final_report = match self.download().await {
            Ok(progress) => Report::Progress(progress),
            Err(error) => Report::Failed {
                file: self.file,
                error,
            },
        };
        // The coordinator only drops its receiver once it stops caring.
        let _ = self.reports.send(final_report).await;
    }

    async fn download(&self) -> Result<Progress, HuntError> {
        let reader = self
            .source
            .open(&self.filename)
            .await
            .map_err(|e| HuntError::download(&self.filename, e))?;
        let mut sink = create_sink(&self.path).await?;
        let mut chunks = ChunkedSource::new(reader, self.chunk_size);
        let mut buf = Vec::with_capacity(self.chunk_size);

        let mut progress = Progress {
            file: self.file,
            bytes_written: 0,
            marker_offset: None,
            done: false,
        };

        loop {
            // A stalled read must not outlive cancellation; a chunk cut short
            // here is discarded, never written.
            let read = tokio::select! {
                biased;

                () = self.cancel.cancelled() => {
                    debug!(
                        bytes_written = progress.bytes_written,
                        "cancellation observed, stopping"
                    );
                    break;
                }
                read = chunks.next_chunk(&mut buf) => read
                    .map_err(|e| HuntError::download(&self.filename, SourceError::Read(e)))?,
            };

            if progress.marker_offset.is_none() {
                progress.marker_offset = find_marker(&buf, progress.bytes_written, self.marker);
            }

            sink.write_all(&buf)
                .await
                .map_err(|e| HuntError::sink(&self.path, e))?;
            progress.bytes_written += read as u64;

            if chunks.is_exhausted() {
                break;
            }

            trace!(
                bytes_written = progress.bytes_written,
                marker_offset = ?progress.marker_offset,
                "chunk written"
            );
            if self.reports.send(Report::Progress(progress)).await.is_err() {
                debug!("coordinator gone, stopping");
                break;
            }
        }

        sink.flush()
            .await
            .map_err(|e| HuntError::sink(&self.path, e))?;
        drop(sink);

        progress.done = true;
        Ok(progress)
    }
}
