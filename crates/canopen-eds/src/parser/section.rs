// crates/canopen-eds/src/parser/section.rs

//! Splitting raw EDS text into sections and fault-tolerant field reads.

use crate::error::EdsError;
use crate::types::parse_int;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use log::{error, trace, warn};

/// Comment-line key that assigns a firmware storage location to an object.
pub(crate) const STORAGE_LOCATION_MARKER: &str = "StorageLocation";

/// One `[header]` block of the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Section {
    /// Header line including the brackets, e.g. `[1018sub0]`.
    pub header: String,
    /// `;` lines preceding the header, without the leading `;`.
    pub comment: String,
    /// Tag of a `;StorageLocation=` line after the header.
    pub storage_location: Option<String>,
    /// `Key=Value` pairs in file order.
    pub fields: Vec<(String, String)>,
}

impl Section {
    /// Header text without the brackets.
    pub fn name(&self) -> &str {
        self.header
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(&self.header)
    }

    /// Value of `key`; the last occurrence wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(|(k, _)| k.as_str())
    }
}

/// Ordered list of recoverable problems found while reading a file.
#[derive(Debug, Default)]
pub(crate) struct Notes {
    messages: Vec<String>,
}

impl Notes {
    pub fn push(&mut self, message: String) {
        warn!("{}", message);
        self.messages.push(message);
    }

    pub fn into_vec(self) -> Vec<String> {
        self.messages
    }
}

/// Splits `text` into sections on blank lines.
///
/// A block made only of `;` lines is carried over as the comment of the
/// next section. Any other block without a `[header]` line is fatal.
pub(crate) fn split_sections(text: &str, notes: &mut Notes) -> Result<Vec<Section>, EdsError> {
    let mut sections = Vec::new();
    let mut pending_comment: Vec<&str> = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    let mut block_count = 0usize;

    let mut lines = text.lines().peekable();
    while lines.peek().is_some() {
        block.clear();
        // Gather one block of non-blank lines.
        for line in lines.by_ref() {
            if line.trim().is_empty() {
                if block.is_empty() {
                    continue;
                }
                break;
            }
            block.push(line);
        }
        if block.is_empty() {
            break;
        }
        block_count += 1;

        let Some(header_pos) = block.iter().position(|l| l.trim_start().starts_with('[')) else {
            if block.iter().all(|l| l.trim_start().starts_with(';')) {
                pending_comment.extend(block.iter().copied());
                continue;
            }
            error!("Section {} has no [header] line", block_count);
            return Err(EdsError::MissingHeader {
                section: block_count,
            });
        };

        let header = block[header_pos].trim().to_string();
        let mut comment_lines = core::mem::take(&mut pending_comment);
        for line in &block[..header_pos] {
            if line.trim_start().starts_with(';') {
                comment_lines.push(*line);
            } else {
                notes.push(format!("Line \"{}\" before {} was ignored", line.trim(), header));
            }
        }
        let comment = comment_lines
            .iter()
            .map(|l| strip_comment(l))
            .collect::<Vec<_>>()
            .join("\n");

        let mut section = Section {
            header,
            comment,
            storage_location: None,
            fields: Vec::new(),
        };
        for line in &block[header_pos + 1..] {
            read_line(&mut section, line, notes);
        }
        trace!(
            "Split section {} with {} fields",
            section.header,
            section.fields.len()
        );
        sections.push(section);
    }

    Ok(sections)
}

fn strip_comment(line: &str) -> &str {
    line.trim_start().strip_prefix(';').unwrap_or(line)
}

fn read_line(section: &mut Section, line: &str, notes: &mut Notes) {
    let line = line.trim();
    if let Some(comment) = line.strip_prefix(';') {
        match comment.split_once('=') {
            Some((key, tag)) if key.trim() == STORAGE_LOCATION_MARKER => {
                section.storage_location = Some(tag.trim().to_string());
            }
            _ => trace!("Ignored comment \"{}\" in {}", line, section.header),
        }
        return;
    }
    match line.split_once('=') {
        Some((key, value)) => {
            let key = key.trim();
            if section.get(key).is_some() {
                notes.push(format!("Entry \"{}\" was repeated in {}", key, section.header));
            }
            section
                .fields
                .push((key.to_string(), value.trim().to_string()));
        }
        None => notes.push(format!(
            "Line \"{}\" in {} is not a key=value entry",
            line, section.header
        )),
    }
}

/// Reads typed fields from a section, recording one note per missing or
/// malformed value and substituting the given default.
pub(crate) struct FieldReader<'a> {
    section: &'a Section,
    notes: &'a mut Notes,
}

impl<'a> FieldReader<'a> {
    pub fn new(section: &'a Section, notes: &'a mut Notes) -> Self {
        Self { section, notes }
    }

    fn missing(&mut self, key: &str) {
        let message = format!("{} was missing in {}", key, self.section.header);
        self.notes.push(message);
    }

    fn malformed(&mut self, key: &str) {
        let message = format!("{} was incorrectly formatted in {}", key, self.section.header);
        self.notes.push(message);
    }

    /// A field that must be present.
    pub fn required<T>(&mut self, key: &str, parse: impl Fn(&str) -> Option<T>, default: T) -> T {
        match self.section.get(key) {
            None => {
                self.missing(key);
                default
            }
            Some(raw) => match parse(raw) {
                Some(value) => value,
                None => {
                    self.malformed(key);
                    default
                }
            },
        }
    }

    /// A field that may be absent; only a malformed value is reported.
    pub fn optional<T>(&mut self, key: &str, parse: impl Fn(&str) -> Option<T>, default: T) -> T {
        match self.section.get(key) {
            None => default,
            Some(raw) => match parse(raw) {
                Some(value) => value,
                None => {
                    self.malformed(key);
                    default
                }
            },
        }
    }

    pub fn required_text(&mut self, key: &str) -> String {
        self.required(key, |s| Some(s.to_string()), String::new())
    }

    pub fn optional_text(&mut self, key: &str) -> String {
        self.optional(key, |s| Some(s.to_string()), String::new())
    }

    /// Reports every key not listed in `known`.
    pub fn reject_unknown_keys(&mut self, known: &[&str]) {
        let unknown: Vec<String> = self
            .section
            .keys()
            .filter(|k| !known.iter().any(|n| n.eq_ignore_ascii_case(k)))
            .map(|k| format!("Unknown entry \"{}\" in {}", k, self.section.header))
            .collect();
        for message in unknown {
            self.notes.push(message);
        }
    }
}

/// Integer field parser for any target width.
pub(crate) fn int<T: TryFrom<i128>>(s: &str) -> Option<T> {
    parse_int(s).ok().and_then(|v| T::try_from(v).ok())
}

/// `0`/`1` flag parser; any non-zero integer counts as set.
pub(crate) fn flag(s: &str) -> Option<bool> {
    parse_int(s).ok().map(|v| v != 0)
}
