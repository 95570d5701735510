//! Fetch the articles listed in a manifest

use crate::counter::CountingReader;
use crate::error::{NntpError, Result};
use crate::nzb::Segment;
use crate::report::{DownloadReport, kb_per_sec, millis};
use crate::session::NntpSession;
use crate::yenc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing::debug;

/// Downloads segments one by one and checks what arrived
#[derive(Debug, Clone)]
pub struct Downloader {
    verify_yenc: bool,
}

impl Default for Downloader {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Downloader {
    /// `verify_yenc` decodes each body and checks its size and CRC
    pub fn new(verify_yenc: bool) -> Self {
        Self { verify_yenc }
    }

    /// Connect, authenticate, download, then close the session
    pub async fn run(
        &self,
        session: &mut NntpSession,
        segments: &[Segment],
    ) -> Result<DownloadReport> {
        let result = async {
            let (conn, auth) = super::open(session).await?;
            let mut report = self.download(session, segments).await?;
            report.conn = conn;
            report.auth = auth;
            Ok::<_, NntpError>(report)
        }
        .await;
        super::finish(session, result).await
    }

    /// Fetch every segment over an authenticated session
    ///
    /// The whole article (headers included) must be strictly larger than
    /// the size the manifest recorded for it.
    pub async fn download(
        &self,
        session: &mut NntpSession,
        segments: &[Segment],
    ) -> Result<DownloadReport> {
        let mut report = DownloadReport::default();
        let mut body = Vec::new();
        let mut last = Instant::now();

        for segment in segments {
            body.clear();
            let received = fetch(session, &segment.message_id, &mut body).await?;
            if received <= segment.bytes {
                return Err(NntpError::Integrity(format!(
                    "ByteCount mismatch, expect>{} recv={}",
                    segment.bytes, received
                )));
            }

            if self.verify_yenc {
                yenc::decode(&body)?.verify()?;
            }

            let now = Instant::now();
            let elapsed = now - last;
            let speed = kb_per_sec(received, elapsed);
            debug!(
                "Download {} ({} bytes in {:.3}ms with {:.1} KB/s)",
                segment.message_id,
                received,
                millis(elapsed),
                speed
            );
            report.arts.push(millis(elapsed));
            report.kb_sec.push(speed);
            last = now;
        }

        Ok(report)
    }
}

/// Read one article, leaving its body in `body`
///
/// Returns the article's total size after dot-unstuffing.
async fn fetch(session: &mut NntpSession, message_id: &str, body: &mut Vec<u8>) -> Result<u64> {
    let article = session.article(message_id).await?;
    let mut reader = BufReader::new(CountingReader::new(article));

    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            return Err(NntpError::Integrity(format!(
                "article {message_id} ended inside its headers"
            )));
        }
        if line == b"\r\n" {
            break;
        }
    }
    reader.read_to_end(body).await?;

    Ok(reader.get_ref().count())
}
