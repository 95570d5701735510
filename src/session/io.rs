//! Line-mode I/O primitives
//!
//! Every command and response line passes through here:
//! - command transmission with logging and flush
//! - single-line reads with CRLF validation
//! - prefix classification of responses

use super::NntpSession;
use crate::commands::{self, CRLF};
use crate::error::{NntpError, Result};
use crate::response::{Expect, classify};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt};
use tracing::{debug, trace};

const LINE_INITIAL_CAPACITY: usize = 512;

impl NntpSession {
    /// Protocol trace, promoted to debug level for verbose sessions
    pub(super) fn log_line(&self, direction: &str, line: &str) {
        if self.config.verbose {
            debug!("C({}) {} {}", self.config.name, direction, line);
        } else {
            trace!("C({}) {} {}", self.config.name, direction, line);
        }
    }

    /// Write `command` plus CRLF and flush
    pub(super) async fn write_command(&mut self, command: &str) -> Result<()> {
        self.log_line(">>", commands::redact(command));
        let conn = self.connection()?;
        conn.write_all(command.as_bytes()).await?;
        conn.write_all(CRLF.as_bytes()).await?;
        conn.flush().await?;
        self.bytes_out += (command.len() + CRLF.len()) as u64;
        Ok(())
    }

    /// Read one CRLF-terminated line and return it without the terminator
    ///
    /// # Errors
    ///
    /// - [`NntpError::ConnectionClosed`] - the connection ended before any byte
    /// - [`NntpError::MalformedLine`] - the line does not end with CRLF
    pub async fn read_line(&mut self) -> Result<String> {
        let conn = self.connection()?;
        let mut raw = Vec::with_capacity(LINE_INITIAL_CAPACITY);
        conn.read_until(b'\n', &mut raw).await?;

        if raw.is_empty() {
            return Err(NntpError::ConnectionClosed);
        }
        let Some(content) = raw.strip_suffix(b"\r\n") else {
            return Err(NntpError::MalformedLine(
                String::from_utf8_lossy(&raw).into_owned(),
            ));
        };

        self.bytes_in += content.len() as u64;
        let line = String::from_utf8_lossy(content).into_owned();
        self.log_line("<<", &line);
        Ok(line)
    }

    /// Read the next line and check it against `rules`
    pub async fn expect(&mut self, rules: &[Expect]) -> Result<String> {
        let line = self.read_line().await?;
        classify(&line, rules)?;
        Ok(line)
    }

    /// Send `command` and check the response line against `rules`
    ///
    /// Returns the raw response line on success.
    ///
    /// # Errors
    ///
    /// - [`NntpError::ErrorRange`] - an error rule matched; carries the line
    /// - [`NntpError::UnexpectedResponse`] - no rule matched
    /// - [`NntpError::Io`] - the transport failed
    pub async fn send(&mut self, command: &str, rules: &[Expect]) -> Result<String> {
        self.write_command(command).await?;
        self.expect(rules).await
    }
}
