//! Timed upload and download runs over one session
//!
//! A run connects, authenticates, then moves articles one at a time and
//! records how long each step took. The first error ends the run; callers
//! turn it into a report with [`UploadReport::failure`](crate::UploadReport::failure)
//! or [`DownloadReport::failure`](crate::DownloadReport::failure).

mod download;
mod msgid;
mod upload;

pub use download::Downloader;
pub use msgid::{MessageIdGenerator, RandomMessageId};
pub use upload::{UploadOutcome, Uploader};

use crate::error::Result;
use crate::report::millis;
use crate::session::NntpSession;
use std::time::Instant;
use tracing::debug;

/// Connect and authenticate, returning (connect ms, auth ms)
async fn open(session: &mut NntpSession) -> Result<(f64, f64)> {
    let begin = Instant::now();
    session.init().await?;
    let connected = Instant::now();
    session.authenticate().await?;
    let authed = Instant::now();

    let timings = (
        millis(connected - begin),
        millis(authed - connected),
    );
    debug!("Connected in {:.3}ms, authenticated in {:.3}ms", timings.0, timings.1);
    Ok(timings)
}

/// Close after a run, keeping the run's own error first
async fn finish<T>(session: &mut NntpSession, result: Result<T>) -> Result<T> {
    if let Err(e) = session.close().await {
        debug!("Close after run failed: {}", e);
    }
    result
}
