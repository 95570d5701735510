use crate::commands::{self, END_OF_BLOCK};
use crate::error::Result;
use crate::response::{Expect, codes};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::state::SessionState;
use super::{Connection, NntpSession};

impl NntpSession {
    /// Start posting an article
    ///
    /// Sends `POST` and requires `340 `. The caller then writes the article
    /// (headers, blank line, body) to [`writer`](Self::writer) and finishes
    /// with [`post_close`](Self::post_close). The body is written as-is, no
    /// dot-stuffing is applied.
    pub async fn post(&mut self) -> Result<()> {
        self.require_state(SessionState::Connected, "post")?;
        self.send(commands::post(), &[Expect::ok(codes::SEND_ARTICLE)])
            .await?;
        self.state = SessionState::Posting;
        Ok(())
    }

    /// Buffered writer for the article being posted
    pub fn writer(&mut self) -> Result<&mut Connection> {
        self.require_state(SessionState::Posting, "writer")?;
        self.connection()
    }

    /// Finish the article: write `CRLF . CRLF`, flush, require `240 `
    pub async fn post_close(&mut self) -> Result<()> {
        self.require_state(SessionState::Posting, "post_close")?;
        let conn = self.connection()?;
        conn.write_all(END_OF_BLOCK.as_bytes()).await?;
        conn.flush().await?;
        self.bytes_out += END_OF_BLOCK.len() as u64;
        self.state = SessionState::Connected;

        self.expect(&[Expect::ok(codes::ARTICLE_POSTED)]).await?;
        debug!("Article posted");
        Ok(())
    }
}
