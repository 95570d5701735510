//! Server, encoding and posting configuration
//!
//! All configuration is constructed once by the caller and passed by
//! reference into the session, the multipart writer and the transfer drivers.

use crate::error::{NntpError, Result};
use std::time::Duration;

/// Default raw bytes per article part (750 KiB)
pub const DEFAULT_PART_SIZE: usize = 768_000;

/// Default yEnc line width
pub const DEFAULT_LINE_LENGTH: usize = 128;

/// Largest line width the yEnc convention allows
pub const MAX_LINE_LENGTH: usize = 997;

/// NNTP server configuration
///
/// # Example
///
/// ```
/// use nntp_sla::ServerConfig;
///
/// let config = ServerConfig::plain("news.example.com", "user", "pass");
/// assert_eq!(config.address(), "news.example.com:119");
/// ```
#[must_use]
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServerConfig {
    /// Server hostname (e.g., "news.example.com")
    pub host: String,

    /// Server port (typically 119 for plain, 563 for TLS)
    pub port: u16,

    /// Wrap the connection in TLS
    #[cfg_attr(feature = "serde", serde(default))]
    pub tls: bool,

    /// Allow insecure TLS connections (self-signed certificates, expired certificates)
    ///
    /// **Security Warning:** Setting this to `true` disables certificate validation,
    /// making your connection vulnerable to man-in-the-middle attacks. Only use this
    /// for testing or with servers you trust on a secure network.
    #[cfg_attr(feature = "serde", serde(default))]
    pub allow_insecure_tls: bool,

    /// Username for authentication
    pub username: String,

    /// Password for authentication
    pub password: String,

    /// Session label used in protocol logs
    #[cfg_attr(feature = "serde", serde(default = "default_name"))]
    pub name: String,

    /// Log protocol traffic at debug level instead of trace
    #[cfg_attr(feature = "serde", serde(default))]
    pub verbose: bool,

    /// Deadline for the TCP connect; `None` waits for the OS
    #[cfg_attr(feature = "serde", serde(default))]
    pub connect_timeout: Option<Duration>,
}

#[cfg(feature = "serde")]
fn default_name() -> String {
    "1".to_string()
}

impl ServerConfig {
    /// Create a new server configuration
    pub fn new(
        host: impl Into<String>,
        port: u16,
        tls: bool,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            tls,
            allow_insecure_tls: false,
            username: username.into(),
            password: password.into(),
            name: "1".to_string(),
            verbose: false,
            connect_timeout: Some(Duration::from_secs(120)),
        }
    }

    /// Create a configuration for a TLS connection on the standard secure port (563)
    pub fn tls(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::new(host, 563, true, username, password)
    }

    /// Create a configuration for a plain connection on the standard port (119)
    ///
    /// **Warning:** Plain connections transmit credentials in clear text.
    pub fn plain(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::new(host, 119, false, username, password)
    }

    /// Create a TLS configuration that accepts self-signed certificates
    pub fn tls_insecure(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let mut config = Self::tls(host, username, password);
        config.allow_insecure_tls = true;
        config
    }

    /// Set the session label used in logs
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Enable or disable verbose protocol logging
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// `host:port` as passed to the resolver
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// yEnc multipart encoding parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct YencConfig {
    /// Raw payload bytes per part
    pub part_size: usize,
    /// Encoded data units per line
    pub line_length: usize,
}

impl Default for YencConfig {
    fn default() -> Self {
        Self {
            part_size: DEFAULT_PART_SIZE,
            line_length: DEFAULT_LINE_LENGTH,
        }
    }
}

impl YencConfig {
    /// Reject values the encoder cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.part_size == 0 {
            return Err(NntpError::Config("part_size must be > 0".to_string()));
        }
        if self.line_length == 0 || self.line_length > MAX_LINE_LENGTH {
            return Err(NntpError::Config(format!(
                "Invalid line length: {} (must be 1-{})",
                self.line_length, MAX_LINE_LENGTH
            )));
        }
        Ok(())
    }
}

/// Header values written in front of every posted part
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PostConfig {
    /// From header
    pub from: String,
    /// Organization header
    pub organization: String,
    /// Newsgroups the parts are posted to
    pub newsgroups: Vec<String>,
    /// Subject shared by all parts
    pub subject: String,
    /// Suffix appended to generated message-ids (e.g. "@example.com")
    pub message_domain: String,
}

impl PostConfig {
    /// Create a posting configuration for a single newsgroup
    pub fn new(
        from: impl Into<String>,
        newsgroup: impl Into<String>,
        subject: impl Into<String>,
        message_domain: impl Into<String>,
    ) -> Self {
        let from = from.into();
        Self {
            organization: from.clone(),
            from,
            newsgroups: vec![newsgroup.into()],
            subject: subject.into(),
            message_domain: message_domain.into(),
        }
    }
}
