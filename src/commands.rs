//! NNTP command builders
//!
//! Commands are returned without the line terminator; the session appends it.

/// Line terminator
pub const CRLF: &str = "\r\n";

/// End of a multi-line data block, written after a posted body
pub const END_OF_BLOCK: &str = "\r\n.\r\n";

/// Build AUTHINFO USER command
pub fn authinfo_user(username: &str) -> String {
    format!("authinfo user {}", username)
}

/// Build AUTHINFO PASS command
pub fn authinfo_pass(password: &str) -> String {
    format!("authinfo pass {}", password)
}

/// Build ARTICLE command for a bare message-id (without angle brackets)
pub fn article(message_id: &str) -> String {
    format!("article <{}>", message_id)
}

/// Build POST command
pub fn post() -> &'static str {
    "POST"
}

/// Build QUIT command
pub fn quit() -> &'static str {
    "QUIT"
}

/// Text safe to log for `command`, with credentials masked
pub(crate) fn redact(command: &str) -> &str {
    if command.starts_with("authinfo pass ") {
        "authinfo pass ****"
    } else {
        command
    }
}
