//! Earliest Core Library
//!
//! This library downloads every file named by a remote directory listing and
//! keeps only the files in which a marker byte occurs at the earliest offset.
//! Downloads run concurrently; a download whose file can no longer win is
//! cancelled and its partial file removed.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`listing`] - Directory listing fetch and parsing
//! - [`source`] - Remote file streams and fixed-size chunking
//! - [`scan`] - Marker search within a chunk
//! - [`hunt`] - Download workers and the coordinating consensus
//! - [`cleanup`] - Local sink creation and loser removal

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cleanup;
pub mod hunt;
pub mod listing;
pub mod scan;
pub mod source;
mod user_agent;

// Re-export commonly used types
pub use cleanup::{create_sink, remove_files};
pub use hunt::{
    CONNECT_TIMEOUT_SECS, DEFAULT_CHUNK_SIZE, DEFAULT_MARKER, FailurePolicy, HuntConfig,
    HuntError, HuntReport, MAX_CHUNK_SIZE, READ_TIMEOUT_SECS, hunt, run,
};
pub use listing::{ListingError, fetch_listing, parse_listing};
pub use scan::find_marker;
pub use source::{BoxedReader, ChunkedSource, HttpSource, RemoteSource, SourceError};
