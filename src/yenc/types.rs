use crate::{NntpError, Result};

/// yEnc header from =ybegin line
#[derive(Debug, Clone, PartialEq)]
pub struct YencHeader {
    /// Line length (typically 128, max 997)
    pub line: usize,
    /// Total payload size in bytes
    pub size: u64,
    /// Original filename
    pub name: String,
    /// Part number (for multi-part payloads)
    pub part: Option<u32>,
    /// Total number of parts (for multi-part payloads)
    pub total: Option<u32>,
}

/// yEnc part header from =ypart line
#[derive(Debug, Clone, PartialEq)]
pub struct YencPart {
    /// First byte of this part in the payload (1-based)
    pub begin: u64,
    /// Last byte of this part in the payload (inclusive)
    pub end: u64,
}

/// yEnc trailer from =yend line
#[derive(Debug, Clone, PartialEq)]
pub struct YencEnd {
    /// Size of the decoded part in bytes
    pub size: u64,
    /// Part number repeated from the header
    pub part: Option<u32>,
    /// CRC32 of the entire payload
    pub crc32: Option<u32>,
    /// CRC32 of this part only
    pub pcrc32: Option<u32>,
}

/// Complete yEnc decoded result
#[derive(Debug, Clone)]
pub struct YencDecoded {
    /// Parsed header information
    pub header: YencHeader,
    /// Part information (for multi-part payloads)
    pub part: Option<YencPart>,
    /// Trailer information
    pub trailer: YencEnd,
    /// Decoded binary data
    pub data: Vec<u8>,
    /// Calculated CRC32 of decoded data
    pub calculated_crc32: u32,
}

impl YencDecoded {
    /// Check decoded size and checksum against the trailer
    ///
    /// Prefers `pcrc32` over `crc32`; a trailer without either only has its size
    /// checked.
    pub fn verify(&self) -> Result<()> {
        if self.data.len() as u64 != self.trailer.size {
            return Err(NntpError::Integrity(format!(
                "yEnc size mismatch, expect={} decoded={}",
                self.trailer.size,
                self.data.len()
            )));
        }
        if let Some(expected) = self.trailer.pcrc32.or(self.trailer.crc32)
            && expected != self.calculated_crc32
        {
            return Err(NntpError::Integrity(format!(
                "yEnc CRC32 mismatch, expect={:08X} decoded={:08X}",
                expected, self.calculated_crc32
            )));
        }
        if let Some(part) = &self.part {
            let span = (part.end + 1).saturating_sub(part.begin);
            if span != self.data.len() as u64 {
                return Err(NntpError::Integrity(format!(
                    "yEnc part range {}-{} does not match {} decoded bytes",
                    part.begin,
                    part.end,
                    self.data.len()
                )));
            }
        }
        Ok(())
    }

    /// Check if this is a multi-part payload
    pub fn is_multipart(&self) -> bool {
        self.header.part.is_some() && self.header.total.is_some()
    }
}
