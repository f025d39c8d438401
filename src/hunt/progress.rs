//! Per-file progress state and the earliest-marker consensus.
//!
//! Everything in here is owned by the coordinator; workers only ever send
//! [`Report`] values describing their own progress.

use super::HuntError;

/// Index of a file within a run (its position in the listing).
pub type FileId = usize;

/// Snapshot of one worker's progress, sent after every chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// The reporting file.
    pub file: FileId,
    /// Bytes committed to the local file so far.
    pub bytes_written: u64,
    /// Absolute offset of the first marker, once seen.
    pub marker_offset: Option<u64>,
    /// Set on the worker's final report; its sink is closed by then.
    pub done: bool,
}

/// Message from a worker to the coordinator.
#[derive(Debug)]
pub enum Report {
    /// Regular progress, including the final `done` report.
    Progress(Progress),
    /// The worker stopped on an I/O error. This is its final report.
    Failed {
        /// The failing file.
        file: FileId,
        /// What went wrong.
        error: HuntError,
    },
}

/// Lifecycle of a file. Every state except `Downloading` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// The worker is still streaming.
    Downloading,
    /// The stream ended on its own.
    Finished,
    /// The coordinator stopped the worker because the file cannot win.
    Cancelled,
    /// The worker stopped on an I/O error.
    Failed,
}

/// Coordinator-side state of one file.
#[derive(Debug, Clone)]
pub struct FileProgress {
    filename: String,
    bytes_written: u64,
    marker_offset: Option<u64>,
    status: FileStatus,
    terminated: bool,
    removed: bool,
}

impl FileProgress {
    /// Creates the state of a file whose worker was just spawned.
    #[must_use]
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            bytes_written: 0,
            marker_offset: None,
            status: FileStatus::Downloading,
            terminated: false,
            removed: false,
        }
    }

    /// The file's name in the listing and in the destination directory.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Bytes committed to the local file.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Offset of the first marker, if seen.
    #[must_use]
    pub fn marker_offset(&self) -> Option<u64> {
        self.marker_offset
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn status(&self) -> FileStatus {
        self.status
    }

    /// Whether the worker has sent its final report.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Whether the local file has already been deleted.
    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Applies a report from this file's worker.
    ///
    /// Returns the marker offset if this report revealed it for the first
    /// time. Byte counts never move backwards and a known marker never changes.
    pub fn record(&mut self, progress: &Progress) -> Option<u64> {
        self.bytes_written = self.bytes_written.max(progress.bytes_written);

        let revealed = match (self.marker_offset, progress.marker_offset) {
            (None, Some(offset)) => {
                self.marker_offset = Some(offset);
                Some(offset)
            }
            _ => None,
        };

        if progress.done {
            self.terminated = true;
            if self.status == FileStatus::Downloading {
                self.status = FileStatus::Finished;
            }
        }

        revealed
    }

    /// Stops the file from winning. Returns `false` if it was already terminal.
    pub fn cancel(&mut self) -> bool {
        if self.status == FileStatus::Downloading {
            self.status = FileStatus::Cancelled;
            true
        } else {
            false
        }
    }

    /// Records that the worker stopped on an error.
    pub fn fail(&mut self) {
        self.terminated = true;
        if self.status == FileStatus::Downloading {
            self.status = FileStatus::Failed;
        }
    }

    /// Records that the local file is gone.
    pub fn mark_removed(&mut self) {
        self.removed = true;
    }

    /// Whether the file is provably beaten by a marker at `earliest`.
    ///
    /// A known marker loses when it is strictly later. An unknown marker
    /// loses once more than `earliest` bytes were examined without it, since
    /// the marker can then only sit strictly after the bound. Equal offsets
    /// tie, and ties are kept.
    #[must_use]
    pub fn cannot_beat(&self, earliest: u64) -> bool {
        match self.marker_offset {
            Some(offset) => offset > earliest,
            None => self.bytes_written > earliest,
        }
    }

    /// Whether the file can still end up kept given the current bound.
    #[must_use]
    pub fn is_contender(&self, earliest: Option<u64>) -> bool {
        match self.status {
            FileStatus::Cancelled | FileStatus::Failed => false,
            FileStatus::Finished => self.marker_offset.is_some() && self.marker_offset <= earliest,
            FileStatus::Downloading => earliest.is_none_or(|bound| !self.cannot_beat(bound)),
        }
    }

    /// Whether the file is kept when the run ends with `earliest` as bound.
    #[must_use]
    pub fn is_winner(&self, earliest: Option<u64>) -> bool {
        self.status == FileStatus::Finished
            && self.marker_offset.is_some()
            && self.marker_offset == earliest
    }
}

/// The smallest marker offset observed across all files so far.
///
/// Starts unset and only ever moves down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Consensus {
    earliest: Option<u64>,
}

impl Consensus {
    /// Creates an unset consensus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current bound, if any marker was seen.
    #[must_use]
    pub fn earliest(&self) -> Option<u64> {
        self.earliest
    }

    /// Folds in a newly observed marker offset.
    ///
    /// Returns `true` if the bound moved.
    pub fn tighten(&mut self, offset: u64) -> bool {
        match self.earliest {
            Some(current) if current <= offset => false,
            _ => {
                self.earliest = Some(offset);
                true
            }
        }
    }
}
