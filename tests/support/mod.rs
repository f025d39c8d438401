//! Shared utilities for integration tests: in-memory sources, failing and
//! endless readers, and directory helpers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{self, Cursor};
use std::path::Path;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use async_trait::async_trait;
use earliest_core::{BoxedReader, RemoteSource, SourceError};
use tokio::io::{AsyncRead, AsyncReadExt, DuplexStream, ReadBuf};

/// How one file of a [`MemorySource`] behaves when opened.
enum Entry {
    Bytes(Vec<u8>),
    MissingOnServer(u16),
    FailAfter(Vec<u8>),
    Endless { fill: u8, served: Arc<AtomicU64> },
    Piped(Mutex<Option<DuplexStream>>),
}

/// A [`RemoteSource`] serving files from memory.
#[derive(Default)]
pub struct MemorySource {
    files: HashMap<String, Entry>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `content` in full.
    pub fn with_file(mut self, name: &str, content: impl Into<Vec<u8>>) -> Self {
        self.files
            .insert(name.to_string(), Entry::Bytes(content.into()));
        self
    }

    /// Fails to open with the given HTTP status.
    pub fn with_status(mut self, name: &str, status: u16) -> Self {
        self.files
            .insert(name.to_string(), Entry::MissingOnServer(status));
        self
    }

    /// Serves `prefix`, then fails the next read.
    pub fn with_failure_after(mut self, name: &str, prefix: impl Into<Vec<u8>>) -> Self {
        self.files
            .insert(name.to_string(), Entry::FailAfter(prefix.into()));
        self
    }

    /// Serves `fill` forever; returns the counter of bytes handed out.
    pub fn with_endless(&mut self, name: &str, fill: u8) -> Arc<AtomicU64> {
        let served = Arc::new(AtomicU64::new(0));
        self.files.insert(
            name.to_string(),
            Entry::Endless {
                fill,
                served: Arc::clone(&served),
            },
        );
        served
    }

    /// Serves whatever the test writes into the returned pipe end; the
    /// stream ends when that end is dropped.
    pub fn with_pipe(&mut self, name: &str) -> DuplexStream {
        let (writer, reader) = tokio::io::duplex(64 * 1024);
        self.files
            .insert(name.to_string(), Entry::Piped(Mutex::new(Some(reader))));
        writer
    }

    pub fn into_arc(self) -> Arc<dyn RemoteSource> {
        Arc::new(self)
    }
}

#[async_trait]
impl RemoteSource for MemorySource {
    async fn open(&self, filename: &str) -> Result<BoxedReader, SourceError> {
        let not_found = || SourceError::HttpStatus {
            url: format!("memory:///{filename}"),
            status: 404,
        };

        match self.files.get(filename).ok_or_else(not_found)? {
            Entry::Bytes(content) => Ok(Box::new(Cursor::new(content.clone()))),
            Entry::MissingOnServer(status) => Err(SourceError::HttpStatus {
                url: format!("memory:///{filename}"),
                status: *status,
            }),
            Entry::FailAfter(prefix) => {
                Ok(Box::new(Cursor::new(prefix.clone()).chain(FailingReader)))
            }
            Entry::Endless { fill, served } => Ok(Box::new(EndlessReader {
                fill: *fill,
                served: Arc::clone(served),
            })),
            Entry::Piped(slot) => {
                let reader = slot
                    .lock()
                    .expect("pipe lock poisoned")
                    .take()
                    .ok_or_else(not_found)?;
                Ok(Box::new(reader))
            }
        }
    }
}

/// Fails every read with a connection reset.
pub struct FailingReader;

impl AsyncRead for FailingReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        )))
    }
}

/// Never ends; counts the bytes it hands out.
pub struct EndlessReader {
    fill: u8,
    served: Arc<AtomicU64>,
}

impl AsyncRead for EndlessReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let n = buf.remaining().min(4096);
        buf.put_slice(&vec![self.fill; n]);
        self.served.fetch_add(n as u64, Ordering::Relaxed);
        Poll::Ready(Ok(()))
    }
}

/// Content of `len` filler bytes with the marker placed at `marker_at`.
pub fn content_with_marker(len: usize, marker_at: Option<usize>, marker: u8) -> Vec<u8> {
    let mut content = vec![b'.'; len];
    if let Some(at) = marker_at {
        content[at] = marker;
    }
    content
}

/// Sorted names of the regular files in `dir`.
pub fn dir_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("failed to read dir")
        .map(|entry| {
            entry
                .expect("failed to read dir entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}

pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}
