//! `=ybegin`, `=ypart` and `=yend` keyword lines

use crate::{NntpError, Result};
use std::collections::HashMap;

use super::types::{YencEnd, YencHeader, YencPart};

/// Number of parts needed for `file_size` bytes at `part_size` bytes per part
pub fn part_count(file_size: usize, part_size: usize) -> usize {
    file_size.div_ceil(part_size)
}

/// Format the multipart header line
///
/// `size` is the size of the whole payload, not of this part.
pub(crate) fn ybegin_line(
    part: usize,
    total: usize,
    line_length: usize,
    size: usize,
    name: &str,
) -> String {
    format!(
        "=ybegin part={} total={} line={} size={} name={}\r\n",
        part, total, line_length, size, name
    )
}

/// Format the part range line (1-based, inclusive offsets)
pub(crate) fn ypart_line(begin: usize, end: usize) -> String {
    format!("=ypart begin={} end={}\r\n", begin, end)
}

/// Format the part trailer; `size` is the raw size of this part
pub(crate) fn yend_line(size: usize, part: usize, pcrc32: u32) -> String {
    format!("=yend size={} part={} pcrc32={:08X}\r\n", size, part, pcrc32)
}

/// Parse yEnc =ybegin header line
///
/// Format: =ybegin [part=1 total=5] line=128 size=123456 name=file.bin
///
/// `name` always comes last and runs to the end of the line.
pub(crate) fn parse_ybegin(line: &str) -> Result<YencHeader> {
    let rest = line
        .strip_prefix("=ybegin ")
        .ok_or_else(|| NntpError::Yenc(format!("Invalid yEnc header: {}", line)))?;

    let (params, name) = match rest.find("name=") {
        Some(idx) => (&rest[..idx], rest[idx + 5..].to_string()),
        None => return Err(NntpError::Yenc("Missing 'name' parameter".to_string())),
    };
    let params = parse_yenc_params(params);

    let line_len = required(&params, "line")?;
    let size = required(&params, "size")?;
    let part = params.get("part").and_then(|s| s.parse().ok());
    let total = params.get("total").and_then(|s| s.parse().ok());

    Ok(YencHeader {
        line: line_len,
        size,
        name,
        part,
        total,
    })
}

/// Parse yEnc =ypart line
///
/// Format: =ypart begin=1 end=123456
pub(crate) fn parse_ypart(line: &str) -> Result<YencPart> {
    let rest = line
        .strip_prefix("=ypart ")
        .ok_or_else(|| NntpError::Yenc(format!("Invalid yEnc part header: {}", line)))?;
    let params = parse_yenc_params(rest);

    Ok(YencPart {
        begin: required(&params, "begin")?,
        end: required(&params, "end")?,
    })
}

/// Parse yEnc =yend line
///
/// Format: =yend size=123456 [part=1] [pcrc32=87654321] [crc32=12345678]
pub(crate) fn parse_yend(line: &str) -> Result<YencEnd> {
    let rest = line
        .strip_prefix("=yend ")
        .ok_or_else(|| NntpError::Yenc(format!("Invalid yEnc trailer: {}", line)))?;
    let params = parse_yenc_params(rest);

    let hex = |key: &str| {
        params
            .get(key)
            .and_then(|s| u32::from_str_radix(s, 16).ok())
    };

    Ok(YencEnd {
        size: required(&params, "size")?,
        part: params.get("part").and_then(|s| s.parse().ok()),
        crc32: hex("crc32"),
        pcrc32: hex("pcrc32"),
    })
}

fn required<T: std::str::FromStr>(params: &HashMap<&str, &str>, key: &str) -> Result<T> {
    params
        .get(key)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| NntpError::Yenc(format!("Missing '{}' parameter", key)))
}

/// Split space separated `key=value` pairs
fn parse_yenc_params(params: &str) -> HashMap<&str, &str> {
    params
        .split(' ')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}
