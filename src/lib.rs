#![doc = include_str!("../README.md")]

/// NNTP command builders
pub mod commands;
mod config;
/// Byte-counting stream adapters
pub mod counter;
mod error;
/// NZB manifest format
pub mod nzb;
/// Per-article timing records
pub mod report;
mod response;
mod session;
/// Timed upload and download runs
pub mod transfer;
/// yEnc encoding, decoding and multipart framing
pub mod yenc;

pub use config::{
    DEFAULT_LINE_LENGTH, DEFAULT_PART_SIZE, MAX_LINE_LENGTH, PostConfig, ServerConfig, YencConfig,
};
pub use counter::{CountingReader, CountingWriter};
pub use error::{NntpError, Result};
pub use nzb::{Nzb, NzbFile, Segment, parse_nzb};
pub use report::{ArticlePerf, DownloadReport, UploadReport};
pub use response::{Expect, classify, codes};
pub use session::{Connection, DotReader, NntpSession, SessionState, Transport};
pub use transfer::{
    Downloader, MessageIdGenerator, RandomMessageId, UploadOutcome, Uploader,
};
pub use yenc::{
    MultipartWriter, YencDecoded, YencEnd, YencHeader, YencPart, decode as yenc_decode,
};
