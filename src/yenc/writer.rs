//! Multipart yEnc writer
//!
//! Buffers a payload of unknown size, then emits it as a sequence of framed
//! parts of `part_size` raw bytes each. Writing and encoding are strictly
//! ordered phases: once the first part has been emitted the payload is frozen.

use crate::config::YencConfig;
use crate::{NntpError, Result};
use std::cell::OnceCell;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::trace;

use super::encode::Encoder;
use super::params::{part_count, ybegin_line, yend_line, ypart_line};

/// Splits a buffered payload into framed yEnc parts
///
/// # Example
///
/// ```
/// # async fn example() -> nntp_sla::Result<()> {
/// use nntp_sla::{MultipartWriter, YencConfig};
///
/// let mut writer = MultipartWriter::new("payload.bin", YencConfig::default())?;
/// writer.write(b"some payload")?;
///
/// let mut article = Vec::new();
/// while let Some(raw) = writer.encode_part(&mut article).await? {
///     assert_eq!(raw, 12);
/// }
/// writer.close()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MultipartWriter {
    name: String,
    part_size: usize,
    encoder: Encoder,
    buf: Vec<u8>,
    /// Raw bytes already emitted
    byte_pos: usize,
    /// Parts already emitted
    part: usize,
    /// Total raw bytes written
    byte_count: usize,
    /// Total parts, computed on first use
    parts: OnceCell<usize>,
}

impl MultipartWriter {
    /// Create a writer for a payload announced as `name`
    pub fn new(name: impl Into<String>, config: YencConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            name: name.into(),
            part_size: config.part_size,
            encoder: Encoder::new(config.line_length)?,
            buf: Vec::new(),
            byte_pos: 0,
            part: 0,
            byte_count: 0,
            parts: OnceCell::new(),
        })
    }

    /// Append payload bytes
    ///
    /// Fails with a usage error once any part has been emitted.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        if self.part != 0 {
            return Err(NntpError::Usage(
                "cannot write once reading started".to_string(),
            ));
        }
        self.buf.extend_from_slice(data);
        self.byte_count += data.len();
        // the part count depends on the total, which just moved
        self.parts.take();
        Ok(data.len())
    }

    /// Number of parts the payload splits into, `ceil(total / part_size)`
    pub fn parts(&self) -> usize {
        *self
            .parts
            .get_or_init(|| part_count(self.byte_count, self.part_size))
    }

    /// Whether another part is left to encode
    pub fn has_next(&self) -> bool {
        self.part < self.parts()
    }

    /// Total raw bytes written
    pub fn len(&self) -> usize {
        self.byte_count
    }

    /// Whether no bytes were written
    pub fn is_empty(&self) -> bool {
        self.byte_count == 0
    }

    /// Raw bytes already emitted through [`encode_part`](Self::encode_part)
    pub fn position(&self) -> usize {
        self.byte_pos
    }

    /// Emit the next framed part into `out`
    ///
    /// Returns the raw byte count of the part, or `Ok(None)` once all parts
    /// have been emitted (and on every call after that). Fails with a usage
    /// error if nothing was ever written.
    pub async fn encode_part<W>(&mut self, out: &mut W) -> Result<Option<usize>>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        if self.byte_count == 0 {
            return Err(NntpError::Usage("buffer empty".to_string()));
        }
        let total = self.parts();
        if self.part == total {
            return Ok(None);
        }
        self.part += 1;
        let part = self.part;

        let begin = self.byte_pos;
        let end = (begin + self.part_size).min(self.byte_count);
        let chunk = &self.buf[begin..end];
        let size = chunk.len();

        let mut prefix = ybegin_line(part, total, self.encoder.line_length(), self.byte_count, &self.name);
        prefix.push_str(&ypart_line(begin + 1, end));
        out.write_all(prefix.as_bytes()).await?;

        self.encoder.encode(chunk, out).await?;

        let suffix = yend_line(size, part, crc32fast::hash(chunk));
        out.write_all(suffix.as_bytes()).await?;

        self.byte_pos = end;
        trace!("Encoded part {}/{} ({} raw bytes)", part, total, size);
        Ok(Some(size))
    }

    /// Ensure every written byte was emitted
    pub fn close(&self) -> Result<()> {
        if self.byte_pos != self.byte_count {
            return Err(NntpError::Integrity(format!(
                "buffer remain={}",
                self.byte_count - self.byte_pos
            )));
        }
        Ok(())
    }
}

impl std::io::Write for MultipartWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        MultipartWriter::write(self, buf).map_err(std::io::Error::other)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
