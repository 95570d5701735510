//! Response classification against expected status prefixes

use crate::error::{NntpError, Result};

/// One accepted response prefix
///
/// A response line is validated against an ordered list of rules; the first
/// rule whose prefix the line starts with decides the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expect {
    /// Status-line prefix, e.g. `"381 "`
    pub prefix: &'static str,
    /// Whether a match means the server reported an error
    pub is_error: bool,
}

impl Expect {
    /// A prefix that completes the command successfully
    pub const fn ok(prefix: &'static str) -> Self {
        Self {
            prefix,
            is_error: false,
        }
    }

    /// A prefix the server uses to reject the command
    pub const fn err(prefix: &'static str) -> Self {
        Self {
            prefix,
            is_error: true,
        }
    }
}

/// Validate `line` against `rules`
///
/// - `Ok(())` when the first matching rule is not an error rule
/// - [`NntpError::ErrorRange`] when it is
/// - [`NntpError::UnexpectedResponse`] when no rule matches
pub fn classify(line: &str, rules: &[Expect]) -> Result<()> {
    match rules.iter().find(|rule| line.starts_with(rule.prefix)) {
        Some(rule) if rule.is_error => Err(NntpError::ErrorRange(line.to_string())),
        Some(_) => Ok(()),
        None => Err(NntpError::UnexpectedResponse {
            received: line.to_string(),
            expected: rules.iter().map(|rule| rule.prefix).collect(),
        }),
    }
}

/// Response prefixes used by the session
pub mod codes {
    /// Welcome banner class (200 posting allowed, 201 no posting)
    pub const WELCOME: &str = "20";
    /// Username accepted, password required
    pub const AUTH_CONTINUE: &str = "381 ";
    /// Authentication accepted
    pub const AUTH_ACCEPTED: &str = "281 ";
    /// Article follows
    pub const ARTICLE_FOLLOWS: &str = "201 ";
    /// Send article to be posted
    pub const SEND_ARTICLE: &str = "340 ";
    /// Article posted successfully
    pub const ARTICLE_POSTED: &str = "240 ";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_success() {
        assert!(classify("381 password required", &[Expect::ok("381 ")]).is_ok());
    }

    #[test]
    fn test_classify_unmatched_is_protocol_error() {
        let err = classify("502 access denied", &[Expect::ok("381 ")]).unwrap_err();
        assert!(err.is_protocol_error());
        match err {
            NntpError::UnexpectedResponse { received, expected } => {
                assert_eq!(received, "502 access denied");
                assert_eq!(expected, vec!["381 "]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_classify_error_range() {
        let rules = [Expect::ok("240 "), Expect::err("441 ")];
        let err = classify("441 posting failed", &rules).unwrap_err();
        assert!(matches!(err, NntpError::ErrorRange(ref line) if line == "441 posting failed"));
        assert!(!err.is_protocol_error());
    }

    #[test]
    fn test_classify_first_match_wins() {
        // A broad error prefix listed first shadows a narrower success prefix
        let rules = [Expect::err("4"), Expect::ok("430 ")];
        assert!(matches!(
            classify("430 no such article", &rules),
            Err(NntpError::ErrorRange(_))
        ));

        let rules = [Expect::ok("430 "), Expect::err("4")];
        assert!(classify("430 no such article", &rules).is_ok());
    }

    #[test]
    fn test_prefix_requires_trailing_space() {
        // "2810" must not satisfy "281 "
        assert!(classify("2810 odd", &[Expect::ok(codes::AUTH_ACCEPTED)]).is_err());
    }

    #[test]
    fn test_welcome_prefix() {
        let rules = [Expect::ok(codes::WELCOME)];
        assert!(classify("200 news.example.com ready", &rules).is_ok());
        assert!(classify("201 no posting", &rules).is_ok());
        assert!(classify("400 service unavailable", &rules).is_err());
    }
}
