//! NZB manifest generation and parsing
//!
//! The upload run records one [`Segment`] per posted article; the manifest
//! written from those segments is what a later download run reads back.
//!
//! Reference: https://sabnzbd.org/wiki/extra/nzb-spec

use crate::{NntpError, Result};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::io::Cursor;

const NZB_NAMESPACE: &str = "http://www.newzbin.com/DTD/2003/nzb";
const NZB_PROLOG: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<!DOCTYPE nzb PUBLIC \"-//newzBin//DTD NZB 1.1//EN\" \"http://www.newzbin.com/DTD/nzb/nzb-1.1.dtd\">\n";

/// One posted article of a file
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    /// 1-based part number
    pub number: u32,
    /// Encoded article body size in bytes
    pub bytes: u64,
    /// Message-ID without angle brackets
    pub message_id: String,
}

impl Segment {
    pub fn new(number: u32, bytes: u64, message_id: impl Into<String>) -> Self {
        Self {
            number,
            bytes,
            message_id: message_id.into(),
        }
    }
}

/// A file entry of a manifest
#[derive(Debug, Clone, PartialEq)]
pub struct NzbFile {
    /// Poster name/email
    pub poster: String,
    /// Unix timestamp of posting
    pub date: i64,
    pub subject: String,
    pub groups: Vec<String>,
    pub segments: Vec<Segment>,
}

impl NzbFile {
    /// Sum of all segment sizes
    pub fn total_bytes(&self) -> u64 {
        self.segments.iter().map(|s| s.bytes).sum()
    }

    /// Segment numbers absent from `1..=max`
    pub fn missing_segments(&self) -> Vec<u32> {
        let seen: HashSet<u32> = self.segments.iter().map(|s| s.number).collect();
        let max = seen.iter().copied().max().unwrap_or(0);
        (1..=max).filter(|n| !seen.contains(n)).collect()
    }

    /// Check that segments are numbered `1..=n` without duplicates
    pub fn validate_segments(&self) -> Result<()> {
        if self.segments.is_empty() {
            return Err(NntpError::Manifest("file has no segments".to_string()));
        }
        let mut seen = HashSet::new();
        for seg in &self.segments {
            if seg.number == 0 {
                return Err(NntpError::Manifest("segment number 0".to_string()));
            }
            if !seen.insert(seg.number) {
                return Err(NntpError::Manifest(format!(
                    "duplicate segment number: {}",
                    seg.number
                )));
            }
        }
        match self.missing_segments().first() {
            Some(n) => Err(NntpError::Manifest(format!("missing segment number: {n}"))),
            None => Ok(()),
        }
    }
}

/// NZB manifest
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Nzb {
    /// `<head>` metadata (title, password, category...)
    pub meta: HashMap<String, String>,
    pub files: Vec<NzbFile>,
}

impl Nzb {
    /// Manifest with a single file, titled after the subject
    pub fn build(
        subject: impl Into<String>,
        poster: impl Into<String>,
        groups: Vec<String>,
        date: i64,
        segments: Vec<Segment>,
    ) -> Self {
        let subject = subject.into();
        Self {
            meta: HashMap::from([("title".to_string(), subject.clone())]),
            files: vec![NzbFile {
                poster: poster.into(),
                date,
                subject,
                groups,
                segments,
            }],
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(NzbFile::total_bytes).sum()
    }

    /// Segments of every file, in document order
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.files.iter().flat_map(|f| f.segments.iter())
    }

    pub fn validate(&self) -> Result<()> {
        if self.files.is_empty() {
            return Err(NntpError::Manifest("NZB has no files".to_string()));
        }
        for (i, file) in self.files.iter().enumerate() {
            file.validate_segments()
                .map_err(|e| NntpError::Manifest(format!("file {}: {}", i, e)))?;
        }
        Ok(())
    }

    /// Serialize as NZB 1.1 XML
    ///
    /// # Example
    /// ```
    /// use nntp_sla::{Nzb, Segment};
    ///
    /// let nzb = Nzb::build(
    ///     "Completion test",
    ///     "poster@example.com",
    ///     vec!["alt.binaries.test".to_string()],
    ///     1234567890,
    ///     vec![Segment::new(1, 768000, "abc@example.com")],
    /// );
    /// let xml = nzb.to_xml().unwrap();
    /// assert!(xml.contains(r#"<segment bytes="768000" number="1">abc@example.com</segment>"#));
    /// ```
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        let mut root = BytesStart::new("nzb");
        root.push_attribute(("xmlns", NZB_NAMESPACE));
        writer.write_event(Event::Start(root)).map_err(xml_error)?;

        if !self.meta.is_empty() {
            writer
                .write_event(Event::Start(BytesStart::new("head")))
                .map_err(xml_error)?;
            let mut meta: Vec<_> = self.meta.iter().collect();
            meta.sort();
            for (key, value) in meta {
                let mut elem = BytesStart::new("meta");
                elem.push_attribute(("type", key.as_str()));
                write_text_element(&mut writer, elem, value)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new("head")))
                .map_err(xml_error)?;
        }

        for file in &self.files {
            let mut elem = BytesStart::new("file");
            elem.push_attribute(("poster", file.poster.as_str()));
            elem.push_attribute(("date", file.date.to_string().as_str()));
            elem.push_attribute(("subject", file.subject.as_str()));
            writer.write_event(Event::Start(elem)).map_err(xml_error)?;

            writer
                .write_event(Event::Start(BytesStart::new("groups")))
                .map_err(xml_error)?;
            for group in &file.groups {
                write_text_element(&mut writer, BytesStart::new("group"), group)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new("groups")))
                .map_err(xml_error)?;

            writer
                .write_event(Event::Start(BytesStart::new("segments")))
                .map_err(xml_error)?;
            for seg in &file.segments {
                let mut elem = BytesStart::new("segment");
                elem.push_attribute(("bytes", seg.bytes.to_string().as_str()));
                elem.push_attribute(("number", seg.number.to_string().as_str()));
                write_text_element(&mut writer, elem, &seg.message_id)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new("segments")))
                .map_err(xml_error)?;

            writer
                .write_event(Event::End(BytesEnd::new("file")))
                .map_err(xml_error)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("nzb")))
            .map_err(xml_error)?;

        let body = String::from_utf8(writer.into_inner().into_inner())
            .map_err(|e| NntpError::Manifest(e.to_string()))?;
        Ok(format!("{NZB_PROLOG}{body}"))
    }
}

fn xml_error(e: impl Display) -> NntpError {
    NntpError::Manifest(format!("XML error: {e}"))
}

fn write_text_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    start: BytesStart<'_>,
    text: &str,
) -> Result<()> {
    let end = BytesEnd::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    writer.write_event(Event::Start(start)).map_err(xml_error)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_error)?;
    writer.write_event(Event::End(end)).map_err(xml_error)?;
    Ok(())
}

fn numeric_attr<T: std::str::FromStr>(start: &BytesStart<'_>, key: &[u8]) -> Result<Option<T>> {
    for attr in start.attributes() {
        let attr = attr.map_err(xml_error)?;
        if attr.key.as_ref() == key {
            let value = attr.unescape_value().map_err(xml_error)?;
            return value.trim().parse().map(Some).map_err(|_| {
                NntpError::Manifest(format!(
                    "invalid {} attribute: {:?}",
                    String::from_utf8_lossy(key),
                    value
                ))
            });
        }
    }
    Ok(None)
}

fn text_attr(start: &BytesStart<'_>, key: &[u8]) -> Result<String> {
    for attr in start.attributes() {
        let attr = attr.map_err(xml_error)?;
        if attr.key.as_ref() == key {
            return Ok(attr.unescape_value().map_err(xml_error)?.into_owned());
        }
    }
    Ok(String::new())
}

/// Where the parser is inside the document
enum Context {
    Other,
    Meta(String),
    Group,
    Segment { number: u32, bytes: u64 },
}

/// Parse an NZB document
///
/// Segments without a message-id are skipped. A segment without a `number`
/// or `bytes` attribute, or with a non-numeric one, is a manifest error.
///
/// # Example
/// ```
/// use nntp_sla::parse_nzb;
///
/// let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
/// <nzb xmlns="http://www.newzbin.com/DTD/2003/nzb">
///   <file poster="user@example.com" date="1234567890" subject="Example [1/1]">
///     <groups><group>alt.binaries.test</group></groups>
///     <segments>
///       <segment bytes="768000" number="1">part1of1@example.com</segment>
///     </segments>
///   </file>
/// </nzb>"#;
///
/// let nzb = parse_nzb(xml).unwrap();
/// assert_eq!(nzb.files[0].segments[0].message_id, "part1of1@example.com");
/// ```
pub fn parse_nzb(xml: &str) -> Result<Nzb> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut nzb = Nzb::default();
    let mut current: Option<NzbFile> = None;
    let mut context = Context::Other;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => match e.name().as_ref() {
                b"meta" => context = Context::Meta(text_attr(&e, b"type")?),
                b"file" => {
                    current = Some(NzbFile {
                        poster: text_attr(&e, b"poster")?,
                        date: numeric_attr(&e, b"date")?.unwrap_or(0),
                        subject: text_attr(&e, b"subject")?,
                        groups: Vec::new(),
                        segments: Vec::new(),
                    });
                }
                b"group" => context = Context::Group,
                b"segment" => {
                    let missing = |name: &str| NntpError::Manifest(format!("segment without {name}"));
                    context = Context::Segment {
                        number: numeric_attr(&e, b"number")?.ok_or_else(|| missing("number"))?,
                        bytes: numeric_attr(&e, b"bytes")?.ok_or_else(|| missing("bytes"))?,
                    };
                }
                _ => {}
            },
            Event::Text(e) => {
                let text = e.unescape().map_err(xml_error)?.trim().to_string();
                if text.is_empty() {
                    continue;
                }
                match (&context, current.as_mut()) {
                    (Context::Meta(key), _) if !key.is_empty() => {
                        nzb.meta.insert(key.clone(), text);
                    }
                    (Context::Group, Some(file)) => file.groups.push(text),
                    (Context::Segment { number, bytes }, Some(file)) => {
                        file.segments.push(Segment::new(*number, *bytes, text));
                    }
                    _ => {}
                }
            }
            Event::End(e) => {
                if e.name().as_ref() == b"file" {
                    if let Some(file) = current.take() {
                        nzb.files.push(file);
                    }
                }
                context = Context::Other;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(nzb)
}
