use crate::config::MAX_LINE_LENGTH;
use crate::{NntpError, Result};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Streaming yEnc body encoder
///
/// Transforms raw bytes into CRLF-terminated lines of at most `line_length`
/// data units. Escape positions depend on the column inside the current line:
///
/// - NUL, LF, CR and `=` are always escaped
/// - TAB and SPACE are escaped in the first and in the last column
/// - `.` is escaped in the first column
///
/// The wrap decision happens after a whole unit was emitted, so an escape pair
/// starting in the last column completes on that line.
#[derive(Debug, Clone)]
pub struct Encoder {
    line_length: usize,
    line: Vec<u8>,
}

impl Encoder {
    /// Create an encoder wrapping at `line_length` (1-997)
    pub fn new(line_length: usize) -> Result<Self> {
        if line_length == 0 || line_length > MAX_LINE_LENGTH {
            return Err(NntpError::Config(format!(
                "Invalid line length: {} (must be 1-{})",
                line_length, MAX_LINE_LENGTH
            )));
        }
        Ok(Self {
            line_length,
            // room for one overflowing escape pair plus CRLF
            line: Vec::with_capacity(line_length + 3),
        })
    }

    /// Configured line width
    pub fn line_length(&self) -> usize {
        self.line_length
    }

    /// Append one raw byte to the current line; true once the line is full
    fn push(&mut self, byte: u8) -> bool {
        let y = byte.wrapping_add(42);
        let column = self.line.len();

        if needs_escape(y, column, self.line_length) {
            self.line.push(b'=');
            self.line.push(y.wrapping_add(64));
        } else {
            self.line.push(y);
        }

        self.line.len() >= self.line_length
    }

    fn terminate_line(&mut self) {
        self.line.extend_from_slice(b"\r\n");
    }

    /// Encode `data` line by line into `out`
    ///
    /// A trailing partial line is CRLF-terminated too. Nothing is written for
    /// empty input.
    pub async fn encode<W>(&mut self, data: &[u8], out: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        self.line.clear();
        for &byte in data {
            if self.push(byte) {
                self.terminate_line();
                out.write_all(&self.line).await?;
                self.line.clear();
            }
        }

        if !self.line.is_empty() {
            self.terminate_line();
            out.write_all(&self.line).await?;
            self.line.clear();
        }
        Ok(())
    }

    /// Encode `data` into a new buffer
    pub fn encode_to_vec(&mut self, data: &[u8]) -> Vec<u8> {
        let mut output = Vec::with_capacity(data.len() + data.len() / 32 + 4);
        self.line.clear();
        for &byte in data {
            if self.push(byte) {
                self.terminate_line();
                output.extend_from_slice(&self.line);
                self.line.clear();
            }
        }

        if !self.line.is_empty() {
            self.terminate_line();
            output.extend_from_slice(&self.line);
            self.line.clear();
        }
        output
    }
}

/// Whether the shifted byte `y` must be escaped at `column`
fn needs_escape(y: u8, column: usize, line_length: usize) -> bool {
    match y {
        0x00 | 0x0A | 0x0D | 0x3D => true,
        0x09 | 0x20 => column == 0 || column + 1 == line_length,
        0x2E => column == 0,
        _ => false,
    }
}

/// Encode `data` with the given line width into a new buffer
///
/// # Example
/// ```
/// let body = nntp_sla::yenc::encode_buffer(b"\x00", 128).unwrap();
/// assert_eq!(body, b"*\r\n");
/// ```
pub fn encode_buffer(data: &[u8], line_length: usize) -> Result<Vec<u8>> {
    Ok(Encoder::new(line_length)?.encode_to_vec(data))
}
