//! Run configuration and its defaults.

use std::time::Duration;

use super::HuntError;

/// Default marker byte.
pub const DEFAULT_MARKER: u8 = b'A';

/// Default chunk size (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Largest accepted chunk size (16 MiB).
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large files).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Capacity of the channel carrying worker reports to the coordinator.
pub(crate) const REPORT_CHANNEL_CAPACITY: usize = 256;

/// What a failed download does to the rest of the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Cancel every download, remove every file and return the error.
    #[default]
    Abort,
    /// Drop the failing file from the race and keep going.
    Disqualify,
}

/// Settings for one run.
#[derive(Debug, Clone)]
pub struct HuntConfig {
    /// Byte whose first occurrence decides which files are kept.
    pub marker: u8,
    /// Bytes read and written per step; also the cancellation granularity.
    pub chunk_size: usize,
    /// Handling of download I/O failures.
    pub failure_policy: FailurePolicy,
    /// HTTP connect timeout.
    pub connect_timeout: Duration,
    /// HTTP timeout for a whole request, body included.
    pub read_timeout: Duration,
}

impl Default for HuntConfig {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER,
            chunk_size: DEFAULT_CHUNK_SIZE,
            failure_policy: FailurePolicy::default(),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(READ_TIMEOUT_SECS),
        }
    }
}

impl HuntConfig {
    /// Returns the configuration with a different marker.
    #[must_use]
    pub fn with_marker(mut self, marker: u8) -> Self {
        self.marker = marker;
        self
    }

    /// Returns the configuration with a different chunk size.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Returns the configuration with a different failure policy.
    #[must_use]
    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    /// Checks the values that would make a run meaningless.
    ///
    /// # Errors
    ///
    /// Returns [`HuntError::InvalidConfig`] for a chunk size of zero or above
    /// [`MAX_CHUNK_SIZE`].
    pub fn validate(&self) -> Result<(), HuntError> {
        if !(1..=MAX_CHUNK_SIZE).contains(&self.chunk_size) {
            return Err(HuntError::invalid_config(format!(
                "chunk size {} must be between 1 and {MAX_CHUNK_SIZE} bytes",
                self.chunk_size
            )));
        }
        Ok(())
    }
}
