use crate::{NntpError, Result};

use super::params::{parse_ybegin, parse_yend, parse_ypart};
use super::types::YencDecoded;

/// Decode one framed yEnc part
///
/// Lines before `=ybegin` (such as the blank line left by the article header
/// separator) are skipped, as is anything after `=yend`.
pub fn decode(input: &[u8]) -> Result<YencDecoded> {
    let lines: Vec<&[u8]> = input
        .split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .collect();

    let begin_idx = lines
        .iter()
        .position(|line| line.starts_with(b"=ybegin "))
        .ok_or_else(|| NntpError::Yenc("Missing =ybegin header".to_string()))?;
    let header = parse_ybegin(ascii(lines[begin_idx])?)?;

    let mut part = None;
    let mut data_start = begin_idx + 1;
    if let Some(line) = lines.get(data_start)
        && line.starts_with(b"=ypart ")
    {
        part = Some(parse_ypart(ascii(line)?)?);
        data_start += 1;
    }

    let trailer_idx = lines[data_start..]
        .iter()
        .position(|line| line.starts_with(b"=yend "))
        .map(|idx| idx + data_start)
        .ok_or_else(|| NntpError::Yenc("Missing =yend trailer".to_string()))?;
    let trailer = parse_yend(ascii(lines[trailer_idx])?)?;

    // decoded output never exceeds the encoded input
    let mut data = Vec::with_capacity(trailer.size.min(input.len() as u64) as usize);
    for line in &lines[data_start..trailer_idx] {
        decode_line(line, &mut data)?;
    }
    let calculated_crc32 = crc32fast::hash(&data);

    Ok(YencDecoded {
        header,
        part,
        trailer,
        data,
        calculated_crc32,
    })
}

/// Decode bare encoded lines without any keyword framing
pub fn decode_body(input: &[u8]) -> Result<Vec<u8>> {
    let mut data = Vec::with_capacity(input.len());
    for line in input.split(|&b| b == b'\n') {
        decode_line(line.strip_suffix(b"\r").unwrap_or(line), &mut data)?;
    }
    Ok(data)
}

fn ascii(line: &[u8]) -> Result<&str> {
    std::str::from_utf8(line)
        .map_err(|_| NntpError::Yenc("Invalid UTF-8 in keyword line".to_string()))
}

/// Reverse the transform for one line: `=X` decodes to `X - 64 - 42`, any
/// other byte to `byte - 42`
fn decode_line(line: &[u8], output: &mut Vec<u8>) -> Result<()> {
    let mut bytes = line.iter();
    while let Some(&byte) = bytes.next() {
        if byte == b'=' {
            let escaped = bytes.next().ok_or_else(|| {
                NntpError::Yenc("Incomplete escape sequence at end of line".to_string())
            })?;
            output.push(escaped.wrapping_sub(64).wrapping_sub(42));
        } else {
            output.push(byte.wrapping_sub(42));
        }
    }
    Ok(())
}
