//! Timing records for upload and download runs

use std::time::Duration;

/// Duration as fractional milliseconds
pub fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Throughput in KiB/s
///
/// The byte count is truncated to whole KiB before dividing, so transfers
/// under 1 KiB report zero. A zero duration reports zero.
pub fn kb_per_sec(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs == 0.0 {
        return 0.0;
    }
    (bytes / 1024) as f64 / secs
}

/// Timing of one posted article
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArticlePerf {
    pub message_id: String,
    /// Elapsed milliseconds
    pub time: f64,
    /// Encoded body bytes
    pub size: u64,
    /// KiB/s
    pub speed: f64,
    /// kbit/s
    pub bit_speed: f64,
}

impl ArticlePerf {
    pub fn new(message_id: impl Into<String>, size: u64, elapsed: Duration) -> Self {
        let speed = kb_per_sec(size, elapsed);
        Self {
            message_id: message_id.into(),
            time: millis(elapsed),
            size,
            speed,
            bit_speed: speed * 8.0,
        }
    }
}

/// Result of an upload run
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UploadReport {
    /// Milliseconds to connect
    pub conn: f64,
    /// Milliseconds to authenticate
    pub auth: f64,
    pub arts: Vec<ArticlePerf>,
    pub error: Vec<String>,
}

impl UploadReport {
    /// Report carrying only the error text
    pub fn failure(err: impl std::fmt::Display) -> Self {
        Self {
            error: vec![err.to_string()],
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_empty()
    }
}

/// Result of a download run
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DownloadReport {
    pub conn: f64,
    pub auth: f64,
    /// Milliseconds per article
    pub arts: Vec<f64>,
    /// KiB/s per article
    pub kb_sec: Vec<f64>,
    pub error: Vec<String>,
}

impl DownloadReport {
    /// Report carrying only the error text
    pub fn failure(err: impl std::fmt::Display) -> Self {
        Self {
            error: vec![err.to_string()],
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_empty()
    }
}
