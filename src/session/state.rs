//! Session lifecycle state

/// Where an [`NntpSession`](super::NntpSession) is in its lifecycle
///
/// `Unconnected -> Connected -> (Posting -> Connected)* -> Closed`. Closed is
/// reachable from every state and is final. Authentication is tracked
/// separately by the session's `ready` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, no connection yet
    Unconnected,
    /// Welcome accepted, commands may be sent
    Connected,
    /// POST accepted, the caller is writing the article body
    Posting,
    /// Torn down; the session cannot be reused
    Closed,
}

impl SessionState {
    /// Short name for error messages
    pub(super) fn as_str(self) -> &'static str {
        match self {
            SessionState::Unconnected => "unconnected",
            SessionState::Connected => "connected",
            SessionState::Posting => "posting",
            SessionState::Closed => "closed",
        }
    }
}
