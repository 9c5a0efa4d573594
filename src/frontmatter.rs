//! Defines the [`Metadata`], [`Document`], and [`Error`] types and the logic
//! for splitting a post source file into its frontmatter header and body.
//!
//! The header is a minimal `key: value` format, not YAML. Each line is parsed
//! on its own and its value type is inferred by [`Value::infer`]. Nested
//! mappings, block sequences (`- item`), multi-line strings and escape
//! sequences are not supported: lines belonging to such constructs are
//! either read as plain `key: value` text or ignored when they contain no
//! `:`.

use crate::value::Value;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

/// The frontmatter fence.
pub const FENCE: &str = "---";

/// A whole post: opening fence, header, closing fence, body. `.` matches
/// newlines so the header and body can span lines.
static POST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\A---\s*\n(.*?)\n---\s*\n(.*)\z").unwrap());

/// Just the opening fence; used to tell which half of the pair is missing.
static START_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\A---\s*\n").unwrap());

/// The parsed header fields in the order they first appeared.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Metadata(Vec<(String, Value)>);

impl Metadata {
    pub fn new() -> Metadata {
        Metadata::default()
    }

    /// Inserts a field. A repeated key replaces the earlier value but keeps
    /// its original position.
    pub fn insert(&mut self, key: String, value: Value) {
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Metadata {
    /// Serializes [`Metadata`] as a map, preserving field order.
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// A post source split into its parsed header and raw body.
#[derive(Debug)]
pub struct Document<'a> {
    pub metadata: Metadata,
    pub body: &'a str,
}

/// Splits `input` into frontmatter and body, parsing the frontmatter. The
/// input must be structured as follows:
///
/// 1. Initial fence (`---`) on the very first line
/// 2. `key: value` header lines
/// 3. Terminal fence (`---`) on its own line
/// 4. Post body
///
/// For example:
///
/// ```md
/// ---
/// title: Hello World
/// published: 2024-01-15
/// tags: [intro, test]
/// ---
/// # Hello World
/// ```
pub fn parse(input: &str) -> Result<Document<'_>> {
    let captures = match POST.captures(input) {
        Some(captures) => captures,
        None if START_FENCE.is_match(input) => return Err(Error::MissingEndFence),
        None => return Err(Error::MissingStartFence),
    };

    // Both groups always participate in a match.
    let header = captures.get(1).map_or("", |m| m.as_str());
    let body = captures.get(2).map_or("", |m| m.as_str());

    let metadata = parse_header(header);
    tracing::debug!(fields = metadata.len(), "parsed frontmatter");
    Ok(Document { metadata, body })
}

/// Parses header lines into [`Metadata`]. Blank lines and `#` comments are
/// skipped, as are lines without a `:`.
pub fn parse_header(header: &str) -> Metadata {
    let mut metadata = Metadata::new();
    for line in header.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            metadata.insert(key.trim().to_owned(), Value::infer(value));
        }
    }
    metadata
}

/// Represents the result of a frontmatter parse.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a post source file with no usable frontmatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Returned when the source doesn't begin with a fence line (`---`).
    MissingStartFence,

    /// Returned when the opening fence was found but no closing fence line
    /// follows it.
    MissingEndFence,
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingStartFence => write!(
                f,
                "no valid frontmatter found (it must be enclosed in {} lines): \
                 the file must begin with `{}`",
                FENCE, FENCE
            ),
            Error::MissingEndFence => write!(
                f,
                "no valid frontmatter found (it must be enclosed in {} lines): \
                 no closing `{}` line followed by a newline",
                FENCE, FENCE
            ),
        }
    }
}

impl std::error::Error for Error {}
