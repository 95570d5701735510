//! Pass-through readers and writers that tally transferred bytes
//!
//! The running total is a plain `u64` updated through `&mut self`: a counter
//! has a single owner and is never shared between sessions or tasks.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Reader that counts every byte it hands out
#[derive(Debug)]
pub struct CountingReader<R> {
    inner: R,
    count: u64,
}

impl<R> CountingReader<R> {
    /// Wrap `inner` with a zeroed counter
    pub fn new(inner: R) -> Self {
        Self { inner, count: 0 }
    }

    /// Bytes read since creation or the last reset
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Zero the counter, returning the previous total
    pub fn reset(&mut self) -> u64 {
        std::mem::take(&mut self.count)
    }

    /// Unwrap the inner reader
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for CountingReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let result = Pin::new(&mut this.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = result {
            this.count += (buf.filled().len() - before) as u64;
        }
        result
    }
}

/// Writer that counts every byte the inner writer accepts
#[derive(Debug)]
pub struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W> CountingWriter<W> {
    /// Wrap `inner` with a zeroed counter
    pub fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }

    /// Bytes written since creation or the last reset
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Zero the counter, returning the previous total
    pub fn reset(&mut self) -> u64 {
        std::mem::take(&mut self.count)
    }

    /// Unwrap the inner writer
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: AsyncWrite + Unpin> AsyncWrite for CountingWriter<W> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let result = Pin::new(&mut this.inner).poll_write(cx, buf);
        if let Poll::Ready(Ok(n)) = result {
            this.count += n as u64;
        }
        result
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}
