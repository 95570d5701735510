//! Multi-line block reader
//!
//! Streams the body of a multi-line response up to the terminating `.` line,
//! removing the stuffed dot from data lines that begin with `..`. Line
//! terminators inside the block are passed through untouched.

use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncBufRead, AsyncRead, ReadBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DotState {
    /// At the first byte of a line
    BeginLine,
    /// Saw a leading `.`
    Dot,
    /// Saw `.` `\r` at the start of a line
    DotCr,
    /// Inside a line
    Data,
    /// Terminator consumed
    Eof,
}

/// Forward-only reader over one multi-line block
///
/// Reading consumes the block from the connection; once the terminator line
/// has been read every further read returns end-of-file. A connection that
/// ends before the terminator yields [`io::ErrorKind::UnexpectedEof`].
pub struct DotReader<R> {
    inner: R,
    state: DotState,
    /// Failure seen after data was already returned; reported on the next read
    deferred: Option<io::Error>,
}

impl<R> fmt::Debug for DotReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DotReader")
            .field("state", &self.state)
            .field("deferred", &self.deferred)
            .finish_non_exhaustive()
    }
}

impl<R> DotReader<R> {
    /// Start reading a block at a line boundary
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            state: DotState::BeginLine,
            deferred: None,
        }
    }

    /// Whether the terminator line has been consumed
    pub fn is_finished(&self) -> bool {
        self.state == DotState::Eof
    }
}

impl<R: AsyncBufRead + Unpin> AsyncRead for DotReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if let Some(e) = this.deferred.take() {
            return Poll::Ready(Err(e));
        }
        let start = buf.filled().len();

        while buf.remaining() > 0 && this.state != DotState::Eof {
            let available = match Pin::new(&mut this.inner).poll_fill_buf(cx) {
                Poll::Ready(Ok(available)) => available,
                Poll::Ready(Err(e)) if buf.filled().len() > start => {
                    this.deferred = Some(e);
                    return Poll::Ready(Ok(()));
                }
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Pending if buf.filled().len() > start => return Poll::Ready(Ok(())),
                Poll::Pending => return Poll::Pending,
            };
            if available.is_empty() {
                let e = io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed before end of multi-line block",
                );
                if buf.filled().len() > start {
                    this.deferred = Some(e);
                    return Poll::Ready(Ok(()));
                }
                return Poll::Ready(Err(e));
            }

            let mut used = 0;
            while used < available.len() && buf.remaining() > 0 {
                let c = available[used];
                match this.state {
                    DotState::BeginLine if c == b'.' => {
                        used += 1;
                        this.state = DotState::Dot;
                    }
                    DotState::BeginLine => this.state = DotState::Data,
                    DotState::Dot if c == b'\r' => {
                        used += 1;
                        this.state = DotState::DotCr;
                    }
                    // stuffed dot dropped, c is data
                    DotState::Dot => this.state = DotState::Data,
                    DotState::DotCr if c == b'\n' => {
                        used += 1;
                        this.state = DotState::Eof;
                        break;
                    }
                    DotState::DotCr => {
                        // "." CR followed by data: the CR belongs to the line
                        buf.put_slice(b"\r");
                        this.state = DotState::Data;
                    }
                    DotState::Data => {
                        buf.put_slice(&[c]);
                        used += 1;
                        if c == b'\n' {
                            this.state = DotState::BeginLine;
                        }
                    }
                    DotState::Eof => break,
                }
            }
            Pin::new(&mut this.inner).consume(used);
        }

        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, BufReader};

    async fn read_block(wire: &[u8]) -> io::Result<(Vec<u8>, Vec<u8>)> {
        let mut inner = BufReader::with_capacity(3, wire);
        let mut body = Vec::new();
        {
            let mut reader = DotReader::new(&mut inner);
            reader.read_to_end(&mut body).await?;
            assert!(reader.is_finished());
        }
        let mut rest = Vec::new();
        inner.read_to_end(&mut rest).await?;
        Ok((body, rest))
    }

    #[tokio::test]
    async fn test_plain_block() {
        let (body, rest) = read_block(b"line one\r\nline two\r\n.\r\n").await.unwrap();
        assert_eq!(body, b"line one\r\nline two\r\n");
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn test_dot_unstuffing() {
        let (body, _) = read_block(b"..hidden\r\n...\r\n..\r\n.\r\n").await.unwrap();
        assert_eq!(body, b".hidden\r\n..\r\n.\r\n");
    }

    #[tokio::test]
    async fn test_dots_inside_lines_untouched() {
        let (body, _) = read_block(b"a.b.\r\n.\r\n").await.unwrap();
        assert_eq!(body, b"a.b.\r\n");
    }

    #[tokio::test]
    async fn test_stops_at_terminator() {
        let (body, rest) = read_block(b"data\r\n.\r\n201 next response\r\n").await.unwrap();
        assert_eq!(body, b"data\r\n");
        assert_eq!(rest, b"201 next response\r\n");
    }

    #[tokio::test]
    async fn test_empty_block() {
        let (body, _) = read_block(b".\r\n").await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_blank_lines_preserved() {
        let (body, _) = read_block(b"Subject: x\r\n\r\nbody\r\n\r\n.\r\n").await.unwrap();
        assert_eq!(body, b"Subject: x\r\n\r\nbody\r\n\r\n");
    }

    #[tokio::test]
    async fn test_dot_cr_followed_by_data() {
        let (body, _) = read_block(b".\rx\r\n.\r\n").await.unwrap();
        assert_eq!(body, b"\rx\r\n");
    }

    #[tokio::test]
    async fn test_truncated_block_is_error() {
        let err = read_block(b"data\r\n").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_truncation_reported_after_partial_data() {
        let mut inner = BufReader::new(&b"abc\r\nde"[..]);
        let mut reader = DotReader::new(&mut inner);
        let mut buf = [0u8; 64];

        let n = reader.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"abc\r\nde");
        let err = reader.read(&mut buf).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_read_to_end_keeps_data_before_truncation() {
        let mut inner = BufReader::with_capacity(4, &b"Subject: t\r\n\r\nbody\r\n"[..]);
        let mut reader = DotReader::new(&mut inner);
        let mut body = Vec::new();
        let err = reader.read_to_end(&mut body).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert_eq!(body, b"Subject: t\r\n\r\nbody\r\n");
    }

    #[test]
    fn test_debug_without_inner_debug() {
        struct Opaque;
        let reader = DotReader::new(Opaque);
        assert!(format!("{reader:?}").starts_with("DotReader"));
    }

    #[tokio::test]
    async fn test_small_reads() {
        let mut inner = BufReader::new(&b"abc\r\n..d\r\n.\r\n"[..]);
        let mut reader = DotReader::new(&mut inner);
        let mut out = Vec::new();
        let mut one = [0u8; 1];
        loop {
            let n = reader.read(&mut one).await.unwrap();
            if n == 0 {
                break;
            }
            out.push(one[0]);
        }
        assert_eq!(out, b"abc\r\n.d\r\n");
    }
}
