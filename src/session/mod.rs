//! NNTP session over a single connection
//!
//! One session owns one connection and runs one article transaction at a
//! time. Every operation takes `&mut self`, and a fetched article body borrows
//! the session until it has been read, so transactions cannot overlap.

mod articles;
mod auth;
mod connection;
mod dot_reader;
mod io;
mod posting;
mod state;

use crate::config::ServerConfig;
use crate::error::{NntpError, Result};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, BufStream};
use tracing::debug;

pub use dot_reader::DotReader;
pub use state::SessionState;

/// Byte stream a session can run over (TCP, TLS, or an in-memory pipe)
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Transport for T {}

/// Buffered connection owned by a session
pub type Connection = BufStream<Box<dyn Transport>>;

/// NNTP session with typed response checking
///
/// # Example
///
/// ```no_run
/// use nntp_sla::{NntpSession, ServerConfig};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ServerConfig::plain("news.example.com", "user", "pass");
/// let mut session = NntpSession::new(Arc::new(config));
/// session.init().await?;
/// session.authenticate().await?;
/// assert!(session.is_ready());
/// session.close().await?;
/// # Ok(())
/// # }
/// ```
#[must_use]
pub struct NntpSession {
    /// Buffered connection, present while connected or posting
    stream: Option<Connection>,
    /// Lifecycle state
    state: SessionState,
    /// Authenticated
    ready: bool,
    /// Server configuration
    config: Arc<ServerConfig>,
    /// Bytes of response lines read, terminators excluded
    bytes_in: u64,
    /// Bytes of commands and terminators written by the session
    bytes_out: u64,
}

impl NntpSession {
    /// Create an unconnected session
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self {
            stream: None,
            state: SessionState::Unconnected,
            ready: false,
            config,
            bytes_in: 0,
            bytes_out: 0,
        }
    }

    /// Whether authentication succeeded and the session was not closed
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Whether a connection is open
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Bytes of response lines read in line mode, CRLF excluded
    ///
    /// Multi-line bodies read through a [`DotReader`] are not included.
    pub fn bytes_in(&self) -> u64 {
        self.bytes_in
    }

    /// Bytes of commands and block terminators written by the session
    pub fn bytes_out(&self) -> u64 {
        self.bytes_out
    }

    /// Server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    fn connection(&mut self) -> Result<&mut Connection> {
        let state = self.state;
        self.stream
            .as_mut()
            .ok_or_else(|| NntpError::Usage(format!("session is {}", state.as_str())))
    }

    fn require_state(&self, expected: SessionState, operation: &str) -> Result<()> {
        if self.state != expected {
            return Err(NntpError::Usage(format!(
                "{} requires a {} session, session is {}",
                operation,
                expected.as_str(),
                self.state.as_str()
            )));
        }
        Ok(())
    }
}

impl Drop for NntpSession {
    fn drop(&mut self) {
        debug!("NntpSession {} dropped", self.config.name);
    }
}
