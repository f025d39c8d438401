//! The marker race: download every file, keep only the earliest markers.
//!
//! # Overview
//!
//! [`hunt`] spawns one [`tokio`] task per file. Each task streams its file in
//! fixed-size chunks, scans every chunk for the marker byte, writes it to the
//! destination directory and reports its progress to a single coordinator.
//! The coordinator keeps the earliest marker offset seen so far and cancels
//! downloads that have provably lost. When every task has stopped, only the
//! files whose marker sits exactly at the final bound remain on disk.
//!
//! [`run`] adds the outer layer: fetch the directory listing, then hunt over
//! its files with an HTTP source.
//!
//! # Example
//!
//! ```no_run
//! use earliest_core::{HuntConfig, run};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HuntConfig::default().with_chunk_size(4096);
//! let report = run("http://localhost:8080/", Path::new("./dst"), &config).await?;
//! println!("kept {:?} at offset {:?}", report.kept, report.earliest);
//! # Ok(())
//! # }
//! ```

mod config;
mod coordinator;
mod error;
mod progress;
mod worker;

pub use config::{
    CONNECT_TIMEOUT_SECS, DEFAULT_CHUNK_SIZE, DEFAULT_MARKER, FailurePolicy, HuntConfig,
    MAX_CHUNK_SIZE, READ_TIMEOUT_SECS,
};
pub use error::HuntError;
pub use progress::{Consensus, FileId, FileProgress, FileStatus, Progress, Report};

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{info, instrument, warn};
use url::Url;

use self::config::REPORT_CHANNEL_CAPACITY;
use self::coordinator::Coordinator;
use self::worker::Worker;
use crate::listing::{self, ListingError};
use crate::source::{HttpSource, RemoteSource, build_client};

/// Outcome of a settled run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HuntReport {
    /// The final earliest marker offset, if any file had a marker.
    pub earliest: Option<u64>,
    /// Files left in the destination directory, in listing order.
    pub kept: Vec<String>,
    /// Files deleted from the destination directory, in listing order.
    pub removed: Vec<String>,
    /// Downloads stopped before their stream ended.
    pub cancelled: usize,
    /// Downloads dropped after an I/O failure (only with [`FailurePolicy::Disqualify`]).
    pub failed: usize,
}

/// Fetches the listing at `listing_url` and hunts over the files it names.
///
/// The destination directory is created if it does not exist.
///
/// # Errors
///
/// Returns [`HuntError`] for setup failures (bad URL, unreachable listing,
/// unwritable destination) before any download starts, and for any failure
/// [`hunt`] reports.
#[instrument(skip(config), fields(dst = %dst.display()))]
pub async fn run(
    listing_url: &str,
    dst: &Path,
    config: &HuntConfig,
) -> Result<HuntReport, HuntError> {
    config.validate()?;

    let base = Url::parse(listing_url)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .ok_or_else(|| ListingError::invalid_url(listing_url))?;

    tokio::fs::create_dir_all(dst)
        .await
        .map_err(|source| HuntError::Destination {
            path: dst.to_path_buf(),
            source,
        })?;

    let client = build_client(config.connect_timeout, config.read_timeout)
        .map_err(HuntError::HttpClient)?;
    let filenames = listing::fetch_listing(&client, &base).await?;
    info!(files = filenames.len(), "fetched directory listing");

    let source: Arc<dyn RemoteSource> = Arc::new(HttpSource::new(client, base));
    hunt(source, filenames, dst, config).await
}

/// Downloads `filenames` from `source` into `dst`, keeping only the files
/// whose marker occurs at the earliest offset across all of them.
///
/// Files that tie at the earliest offset are all kept. Files without a
/// marker, with a later marker, or cancelled part way are removed. Repeated
/// names are downloaded once.
///
/// # Errors
///
/// Returns [`HuntError::InvalidConfig`] for an invalid configuration or a
/// name that is not a plain filename. With [`FailurePolicy::Abort`] the
/// first download failure is returned after every file of the run has been
/// removed. Cleanup failures are returned as [`HuntError::Cleanup`].
#[instrument(skip(source, filenames, config), fields(files = filenames.len(), dst = %dst.display()))]
pub async fn hunt(
    source: Arc<dyn RemoteSource>,
    filenames: Vec<String>,
    dst: &Path,
    config: &HuntConfig,
) -> Result<HuntReport, HuntError> {
    config.validate()?;
    let filenames = distinct_filenames(filenames)?;

    let mut coordinator = Coordinator::new(&filenames, dst, config.failure_policy);
    let (reports_tx, mut reports_rx) = mpsc::channel(REPORT_CHANNEL_CAPACITY);
    let mut workers = JoinSet::new();

    for (file, filename) in filenames.into_iter().enumerate() {
        let worker = Worker {
            file,
            path: dst.join(&filename),
            filename,
            source: Arc::clone(&source),
            chunk_size: config.chunk_size,
            marker: config.marker,
            reports: reports_tx.clone(),
            cancel: coordinator.token(file),
        };
        workers.spawn(worker.run());
    }
    drop(reports_tx);

    let collected = coordinator.collect(&mut reports_rx).await;
    if collected.is_err() {
        coordinator.cancel_all();
    }
    // Workers blocked on a full channel see the closed receiver and stop.
    drop(reports_rx);

    let joined = join_workers(&mut workers).await;
    coordinator.finish(joined.and(collected)).await
}

fn distinct_filenames(filenames: Vec<String>) -> Result<Vec<String>, HuntError> {
    let mut seen = HashSet::new();
    let mut distinct = Vec::with_capacity(filenames.len());
    for name in filenames {
        if !listing::is_plain_filename(&name) {
            return Err(HuntError::invalid_config(format!(
                "{name:?} is not a plain filename"
            )));
        }
        if seen.insert(name.clone()) {
            distinct.push(name);
        }
    }
    Ok(distinct)
}

async fn join_workers(workers: &mut JoinSet<()>) -> Result<(), HuntError> {
    let mut result = Ok(());
    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "download task panicked");
            if result.is_ok() {
                result = Err(HuntError::WorkerPanicked(e.to_string()));
            }
        }
    }
    result
}
