//! yEnc binary encoding for Usenet
//!
//! yEnc is a binary-to-text encoding scheme designed specifically for Usenet.
//! It has only 1-2% overhead compared to 33-40% for Base64.
//!
//! Reference: http://www.yenc.org/yenc-draft.1.3.txt

pub mod decode;
pub mod encode;
pub mod params;
pub mod types;
pub mod writer;

pub use decode::{decode, decode_body};
pub use encode::{Encoder, encode_buffer};
pub use params::part_count;
pub use types::{YencDecoded, YencEnd, YencHeader, YencPart};
pub use writer::MultipartWriter;
