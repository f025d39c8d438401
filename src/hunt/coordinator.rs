//! The coordinator: sole owner of every file's state and of the consensus.
//!
//! Workers never touch shared state. They send [`Report`]s over one channel
//! and the coordinator, running a single loop, folds each report in, tightens
//! the earliest-marker bound, cancels workers that can no longer win and
//! deletes their files once they confirm they stopped writing.
//!
//! # Run phases
//!
//! - `Collecting` while any worker has not sent its final report
//! - `Draining` once every worker is accounted for and cleanup is pending
//! - `Done` after the kept set is fixed and every other file is removed
//!
//! Pruning decisions depend only on the bound and on per-file state, both of
//! which move in one direction, so they are safe to re-apply after every
//! report regardless of how reports from different files interleave.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::FailurePolicy;
use super::progress::{Consensus, FileId, FileProgress, FileStatus, Progress, Report};
use super::{HuntError, HuntReport};
use crate::cleanup;

/// Run-level state of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunPhase {
    Collecting,
    Draining,
    Done,
}

pub(crate) struct Coordinator {
    dst: PathBuf,
    policy: FailurePolicy,
    files: Vec<FileProgress>,
    tokens: Vec<CancellationToken>,
    consensus: Consensus,
    phase: RunPhase,
    abort: Option<HuntError>,
}

impl Coordinator {
    pub(crate) fn new(filenames: &[String], dst: &Path, policy: FailurePolicy) -> Self {
        let phase = if filenames.is_empty() {
            RunPhase::Draining
        } else {
            RunPhase::Collecting
        };
        Self {
            dst: dst.to_path_buf(),
            policy,
            files: filenames.iter().map(FileProgress::new).collect(),
            tokens: filenames.iter().map(|_| CancellationToken::new()).collect(),
            consensus: Consensus::new(),
            phase,
            abort: None,
        }
    }

    /// The cancellation token handed to `file`'s worker.
    pub(crate) fn token(&self, file: FileId) -> CancellationToken {
        self.tokens[file].clone()
    }

    #[cfg(test)]
    pub(crate) fn phase(&self) -> RunPhase {
        self.phase
    }

    #[cfg(test)]
    pub(crate) fn earliest(&self) -> Option<u64> {
        self.consensus.earliest()
    }

    #[cfg(test)]
    pub(crate) fn file(&self, file: FileId) -> &FileProgress {
        &self.files[file]
    }

    /// Consumes reports until every worker has sent its final one.
    ///
    /// # Errors
    ///
    /// Returns [`HuntError::ChannelClosed`] if the channel ends first (a
    /// worker died without reporting), or a cleanup error from an early
    /// deletion.
    pub(crate) async fn collect(
        &mut self,
        reports: &mut mpsc::Receiver<Report>,
    ) -> Result<(), HuntError> {
        while self.phase == RunPhase::Collecting {
            let Some(report) = reports.recv().await else {
                let outstanding = self.files.iter().filter(|f| !f.is_terminated()).count();
                return Err(HuntError::ChannelClosed { outstanding });
            };
            self.apply(report).await?;
        }
        Ok(())
    }

    /// Folds one report into the run state.
    pub(crate) async fn apply(&mut self, report: Report) -> Result<(), HuntError> {
        match report {
            Report::Progress(progress) => self.apply_progress(&progress),
            Report::Failed { file, error } => self.apply_failure(file, error),
        }
        self.prune();
        self.sweep().await?;

        if self.files.iter().all(FileProgress::is_terminated) {
            debug!("every download accounted for, draining");
            self.phase = RunPhase::Draining;
        }
        Ok(())
    }

    fn apply_progress(&mut self, progress: &Progress) {
        let file = &mut self.files[progress.file];
        let Some(offset) = file.record(progress) else {
            return;
        };

        if self.consensus.tighten(offset) {
            info!(
                file = %file.filename(),
                offset,
                "earliest marker moved"
            );
        }
    }

    fn apply_failure(&mut self, file: FileId, error: HuntError) {
        let was_cancelled = self.files[file].status() == FileStatus::Cancelled;
        self.files[file].fail();

        if was_cancelled {
            debug!(
                file = %self.files[file].filename(),
                error = %error,
                "cancelled download failed while stopping"
            );
            return;
        }

        match self.policy {
            FailurePolicy::Disqualify => {
                warn!(
                    file = %self.files[file].filename(),
                    error = %error,
                    "download failed, dropping file from the run"
                );
            }
            FailurePolicy::Abort => {
                if self.abort.is_some() {
                    debug!(error = %error, "further failure while aborting");
                    return;
                }
                warn!(
                    file = %self.files[file].filename(),
                    error = %error,
                    "download failed, aborting run"
                );
                self.abort = Some(error);
                self.cancel_all();
            }
        }
    }

    /// Cancels every download that can no longer reach the bound.
    fn prune(&mut self) {
        let Some(earliest) = self.consensus.earliest() else {
            return;
        };

        for (file, token) in self.files.iter_mut().zip(&self.tokens) {
            if file.status() == FileStatus::Downloading && file.cannot_beat(earliest) && file.cancel()
            {
                token.cancel();
                debug!(
                    file = %file.filename(),
                    bytes_written = file.bytes_written(),
                    marker_offset = ?file.marker_offset(),
                    earliest,
                    "cancelled download that cannot win"
                );
            }
        }
    }

    /// Deletes files whose worker has stopped and that can no longer be kept.
    async fn sweep(&mut self) -> Result<(), HuntError> {
        let earliest = self.consensus.earliest();
        for file in &mut self.files {
            if file.is_terminated() && !file.is_removed() && !file.is_contender(earliest) {
                cleanup::remove_file(&self.dst.join(file.filename())).await?;
                file.mark_removed();
            }
        }
        Ok(())
    }

    /// Signals every still-running worker to stop.
    pub(crate) fn cancel_all(&mut self) {
        for (file, token) in self.files.iter_mut().zip(&self.tokens) {
            file.cancel();
            token.cancel();
        }
    }

    /// Settles the run once no worker is writing any more.
    ///
    /// With an error (from collection, a worker panic, or an aborting
    /// failure) every file of the run is removed and the error returned.
    /// Otherwise the winners are kept and everything else is removed.
    pub(crate) async fn finish(
        mut self,
        outcome: Result<(), HuntError>,
    ) -> Result<HuntReport, HuntError> {
        self.phase = RunPhase::Draining;

        if let Some(error) = outcome.err().or_else(|| self.abort.take()) {
            let names = self.files.iter().map(FileProgress::filename);
            if let Err(cleanup_error) = cleanup::remove_files(&self.dst, names).await {
                warn!(error = %cleanup_error, "cleanup after aborted run failed");
            }
            self.phase = RunPhase::Done;
            return Err(error);
        }

        let earliest = self.consensus.earliest();
        let (kept, removed): (Vec<&FileProgress>, Vec<&FileProgress>) =
            self.files.iter().partition(|f| f.is_winner(earliest));
        let kept: Vec<String> = kept.iter().map(|f| f.filename().to_string()).collect();
        let removed: Vec<String> = removed.iter().map(|f| f.filename().to_string()).collect();

        cleanup::remove_files(&self.dst, &removed).await?;

        let report = HuntReport {
            earliest,
            kept,
            removed,
            cancelled: self.count(FileStatus::Cancelled),
            failed: self.count(FileStatus::Failed),
        };
        self.phase = RunPhase::Done;

        info!(
            earliest = ?report.earliest,
            kept = report.kept.len(),
            removed = report.removed.len(),
            cancelled = report.cancelled,
            failed = report.failed,
            "run settled"
        );
        Ok(report)
    }

    fn count(&self, status: FileStatus) -> usize {
        self.files.iter().filter(|f| f.status() == status).count()
    }
}
