//! Post a multipart payload, one article per part

use super::msgid::MessageIdGenerator;
use crate::commands::CRLF;
use crate::config::PostConfig;
use crate::counter::CountingWriter;
use crate::error::{NntpError, Result};
use crate::nzb::Segment;
use crate::report::{ArticlePerf, UploadReport};
use crate::session::NntpSession;
use crate::yenc::MultipartWriter;
use chrono::{DateTime, Utc};
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Timings plus the manifest segments of an upload
#[derive(Debug, Clone, Default)]
pub struct UploadOutcome {
    /// Connect, auth and per-article timings
    pub report: UploadReport,
    /// Posted articles in part order
    pub segments: Vec<Segment>,
}

/// Posts every part of a [`MultipartWriter`] as its own article
pub struct Uploader<G> {
    post: PostConfig,
    generator: G,
}

impl<G: MessageIdGenerator> Uploader<G> {
    /// Uploader posting with `post` headers and ids drawn from `generator`
    pub fn new(post: PostConfig, generator: G) -> Self {
        Self { post, generator }
    }

    /// Header settings used for every article
    pub fn post_config(&self) -> &PostConfig {
        &self.post
    }

    /// Article header block, terminated by the blank line
    ///
    /// `message_id` is given without angle brackets; `Newsgroups` joins the
    /// configured groups with commas.
    pub fn headers(&self, message_id: &str, date: DateTime<Utc>) -> String {
        let fields = [
            ("Message-ID", format!("<{message_id}>")),
            ("Date", date.to_rfc2822()),
            ("Organization", self.post.organization.clone()),
            ("Subject", self.post.subject.clone()),
            ("From", self.post.from.clone()),
            ("Newsgroups", self.post.newsgroups.join(",")),
        ];
        let mut out = String::new();
        for (name, value) in fields {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(&value);
            out.push_str(CRLF);
        }
        out.push_str(CRLF);
        out
    }

    /// Connect, authenticate, upload, then close the session
    pub async fn run(
        &mut self,
        session: &mut NntpSession,
        writer: &mut MultipartWriter,
    ) -> Result<UploadOutcome> {
        let result = async {
            let (conn, auth) = super::open(session).await?;
            let mut outcome = self.upload(session, writer).await?;
            outcome.report.conn = conn;
            outcome.report.auth = auth;
            Ok::<_, NntpError>(outcome)
        }
        .await;
        super::finish(session, result).await
    }

    /// Post every remaining part over an authenticated session
    ///
    /// Each article is headers, blank line, then the framed part. The size
    /// recorded per segment counts the framed part only, not the headers.
    /// After the last part the writer must have no bytes left.
    pub async fn upload(
        &mut self,
        session: &mut NntpSession,
        writer: &mut MultipartWriter,
    ) -> Result<UploadOutcome> {
        if writer.is_empty() {
            return Err(NntpError::Usage("nothing to upload".to_string()));
        }
        debug!(
            "Uploading {} bytes in {} parts as {:?}",
            writer.len(),
            writer.parts(),
            self.post.subject
        );

        let mut outcome = UploadOutcome::default();
        let mut last = Instant::now();
        let mut number = 0u32;

        while writer.has_next() {
            session.post().await?;
            let message_id = self.generator.next_id();
            number += 1;

            let mut out = CountingWriter::new(session.writer()?);
            out.write_all(self.headers(&message_id, Utc::now()).as_bytes())
                .await?;
            out.reset();
            writer.encode_part(&mut out).await?;
            let size = out.count();

            session.post_close().await?;

            let now = Instant::now();
            let perf = ArticlePerf::new(message_id.clone(), size, now - last);
            debug!(
                "Posted {} ({} bytes in {:.3}ms, {:.1} KB/s)",
                message_id, size, perf.time, perf.speed
            );
            outcome.report.arts.push(perf);
            outcome.segments.push(Segment::new(number, size, message_id));
            last = now;
        }
        writer.close()?;

        Ok(outcome)
    }
}
