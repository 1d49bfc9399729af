//! Byte-position tracking reader with mark/reset support.
//!
//! A raw DEFLATE inflater buffers more input than it consumes and does not
//! report where the compressed data ends. To recover exact member
//! boundaries, the gzip decoder marks the stream before every buffer fill
//! and rewinds to the mark once the inflater reports stream end.

use std::io::{self, Read};

/// A reader that counts every byte delivered to the caller and can rewind
/// to a previously marked position.
///
/// `position()` reflects bytes the caller has actually consumed (or
/// skipped), not bytes fetched from the underlying source; end of input
/// does not advance it. Replay buffering is internal, so any `Read` source
/// supports mark/reset within the marked limit.
pub struct PositionReader<R: Read>
{
    inner: R,
    /// Bytes delivered to the caller so far.
    position: u64,
    /// Retained bytes since the most recent mark, followed by pending replay.
    buffer: Vec<u8>,
    /// Read cursor within `buffer`; everything before it was delivered.
    cursor: usize,
    marked: bool,
    /// Retention cap; exceeding it invalidates the mark.
    mark_limit: usize,
}

impl<R: Read> PositionReader<R>
{
    pub fn new(inner: R) -> Self
    {
        Self {
            inner,
            position: 0,
            buffer: Vec::new(),
            cursor: 0,
            marked: false,
            mark_limit: 0,
        }
    }

    /// Count of bytes delivered (or skipped) since construction.
    pub fn position(&self) -> u64
    {
        self.position
    }

    /// Record the current position so that `reset` can return to it.
    ///
    /// Up to `limit` bytes are retained; reading past that invalidates the
    /// mark. A new mark replaces the previous one.
    pub fn mark(&mut self, limit: usize)
    {
        self.buffer.drain(..self.cursor);
        self.cursor = 0;
        self.marked = true;
        self.mark_limit = limit;
    }

    /// Rewind the stream and the tracked position to the most recent mark.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - position restored; subsequent reads replay the retained bytes
    /// * `Err(io::Error)` with `ErrorKind::Unsupported` - no mark set, or the
    ///   mark's limit was exceeded
    pub fn reset(&mut self) -> io::Result<()>
    {
        if !self.marked
        {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "mark never set or invalidated by reading past its limit",
            ));
        }
        self.position -= self.cursor as u64;
        self.cursor = 0;
        Ok(())
    }

    /// Read and discard up to `n` bytes, returning how many were skipped.
    ///
    /// Skipped bytes count towards `position()` exactly like read bytes.
    pub fn skip(&mut self, n: u64) -> io::Result<u64>
    {
        let mut remaining = n;
        let mut scratch = [0u8; 512];
        while remaining > 0
        {
            let want = remaining.min(scratch.len() as u64) as usize;
            let got = self.read(&mut scratch[..want])?;
            if got == 0
            {
                break;
            }
            remaining -= got as u64;
        }
        Ok(n - remaining)
    }

    /// Consume the reader and return the underlying source.
    pub fn into_inner(self) -> R
    {
        self.inner
    }
}

impl<R: Read> Read for PositionReader<R>
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>
    {
        if buf.is_empty()
        {
            return Ok(0);
        }

        // Pending replay first.
        if self.cursor < self.buffer.len()
        {
            let n = (self.buffer.len() - self.cursor).min(buf.len());
            buf[..n].copy_from_slice(&self.buffer[self.cursor..self.cursor + n]);
            self.cursor += n;
            self.position += n as u64;
            return Ok(n);
        }

        let n = self.inner.read(buf)?;
        if n > 0 && self.marked
        {
            if self.buffer.len() + n > self.mark_limit
            {
                // The mark can no longer be honored; drop the retained bytes.
                self.marked = false;
                self.buffer.clear();
                self.cursor = 0;
            }
            else
            {
                self.buffer.extend_from_slice(&buf[..n]);
                self.cursor = self.buffer.len();
            }
        }
        self.position += n as u64;
        Ok(n)
    }
}
