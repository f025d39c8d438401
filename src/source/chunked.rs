//! Fixed-size chunking over an arbitrary async reader.

use tokio::io::{AsyncRead, AsyncReadExt};

/// Reads a stream in chunks of exactly `chunk_size` bytes.
///
/// Network readers hand out whatever the socket delivered; this wrapper keeps
/// reading until the chunk is full, so a chunk shorter than `chunk_size`
/// (including an empty one) only ever means the stream has ended.
#[derive(Debug)]
pub struct ChunkedSource<R> {
    reader: R,
    chunk_size: usize,
    exhausted: bool,
}

impl<R> ChunkedSource<R>
where
    R: AsyncRead + Unpin,
{
    /// Wraps `reader`, producing chunks of `chunk_size` bytes.
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            chunk_size,
            exhausted: false,
        }
    }

    /// Returns the configured chunk size.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns `true` once a short chunk has been read.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Replaces the contents of `buf` with the next chunk and returns its length.
    ///
    /// After the stream is exhausted every call yields an empty chunk.
    ///
    /// # Errors
    ///
    /// Returns the underlying reader's error. `buf` may then hold a partial
    /// chunk and should be discarded.
    pub async fn next_chunk(&mut self, buf: &mut Vec<u8>) -> std::io::Result<usize> {
        buf.clear();
        if self.exhausted {
            return Ok(0);
        }

        let limit = u64::try_from(self.chunk_size).unwrap_or(u64::MAX);
        let read = (&mut self.reader).take(limit).read_to_end(buf).await?;
        if read < self.chunk_size {
            self.exhausted = true;
        }
        Ok(read)
    }
}
