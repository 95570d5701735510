//! NNTP error types

use thiserror::Error;

/// Session, codec and transfer errors
#[derive(Error, Debug)]
pub enum NntpError {
    /// IO error during network operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS error during secure connection
    #[error("TLS error: {0}")]
    Tls(String),

    /// TCP connect timeout
    #[error("Connection timeout")]
    Timeout,

    /// Connection could not be set up or the welcome banner was rejected
    #[error("Connection setup failed: {0}")]
    ConnectionSetup(String),

    /// A response line was not terminated by CRLF
    #[error("Line does not end with CRLF: {0:?}")]
    MalformedLine(String),

    /// The response line matched none of the expected prefixes
    #[error("Protocol error. Received={received} (Expected={expected:?})")]
    UnexpectedResponse {
        /// Raw response line
        received: String,
        /// Prefixes that were accepted
        expected: Vec<&'static str>,
    },

    /// The response matched a prefix flagged as an error status class
    ///
    /// Carries the raw response line so callers can report what the server said.
    #[error("NNTP status in error range: {0}")]
    ErrorRange(String),

    /// Component called out of sequence
    #[error("Usage error: {0}")]
    Usage(String),

    /// A size or byte-count invariant failed
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// Connection closed before a line was received
    #[error("Connection closed")]
    ConnectionClosed,

    /// Undecodable yEnc framing
    #[error("yEnc error: {0}")]
    Yenc(String),

    /// NZB manifest could not be parsed
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl NntpError {
    /// Whether this error means the protocol exchange desynchronized
    ///
    /// Covers setup failures, malformed lines and unmatched responses, but not
    /// [`NntpError::ErrorRange`], which is the server rejecting a command.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            NntpError::ConnectionSetup(_)
                | NntpError::MalformedLine(_)
                | NntpError::UnexpectedResponse { .. }
        )
    }

    /// The raw server line carried by the error, if any
    pub fn response_line(&self) -> Option<&str> {
        match self {
            NntpError::ErrorRange(line) => Some(line),
            NntpError::UnexpectedResponse { received, .. } => Some(received),
            _ => None,
        }
    }
}

/// Result type alias using NntpError
pub type Result<T> = std::result::Result<T, NntpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_grouping() {
        assert!(NntpError::ConnectionSetup("x".into()).is_protocol_error());
        assert!(NntpError::MalformedLine("x".into()).is_protocol_error());
        assert!(
            NntpError::UnexpectedResponse {
                received: "502 access denied".into(),
                expected: vec!["381 "],
            }
            .is_protocol_error()
        );
        assert!(!NntpError::ErrorRange("480 no".into()).is_protocol_error());
        assert!(!NntpError::Integrity("x".into()).is_protocol_error());
    }

    #[test]
    fn test_response_line() {
        let err = NntpError::ErrorRange("441 posting failed".into());
        assert_eq!(err.response_line(), Some("441 posting failed"));
        assert_eq!(NntpError::Timeout.response_line(), None);
    }

    #[test]
    fn test_display() {
        let err = NntpError::UnexpectedResponse {
            received: "502 access denied".into(),
            expected: vec!["381 "],
        };
        assert_eq!(
            err.to_string(),
            "Protocol error. Received=502 access denied (Expected=[\"381 \"])"
        );
        assert_eq!(
            NntpError::Usage("empty buffer".into()).to_string(),
            "Usage error: empty buffer"
        );
    }
}
