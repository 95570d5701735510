//! Article retrieval

use super::state::SessionState;
use super::{Connection, DotReader, NntpSession};
use crate::commands;
use crate::error::Result;
use crate::response::{Expect, codes};

impl NntpSession {
    /// Request an article by message-id (without angle brackets)
    ///
    /// Sends `article <msgid>` and requires `201 `. The returned reader
    /// streams the article (headers, blank line, body) up to the terminating
    /// dot line; it borrows the session, so the caller must finish reading it
    /// before issuing the next command.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use nntp_sla::{NntpSession, ServerConfig};
    /// # use std::sync::Arc;
    /// use tokio::io::AsyncReadExt;
    ///
    /// # async fn example(session: &mut NntpSession) -> nntp_sla::Result<()> {
    /// let mut article = Vec::new();
    /// session
    ///     .article("abc123@example.com")
    ///     .await?
    ///     .read_to_end(&mut article)
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn article(&mut self, message_id: &str) -> Result<DotReader<&mut Connection>> {
        self.require_state(SessionState::Connected, "article")?;
        self.send(
            &commands::article(message_id),
            &[Expect::ok(codes::ARTICLE_FOLLOWS)],
        )
        .await?;
        Ok(DotReader::new(self.connection()?))
    }
}
