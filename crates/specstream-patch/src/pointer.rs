//! `/`-delimited paths into a JSON document.
//!
//! Follows RFC 6901 (`~1` is `/`, `~0` is `~`; `""` is the document root and
//! `"/"` is the member named `""`) but is forgiving about the leading slash:
//! `"user/name"` and `"/user/name"` address the same value.

use serde_json::Value;
use std::fmt;

/// A parsed pointer: the list of unescaped reference tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Pointer {
    segments: Vec<String>,
}

impl Pointer {
    /// The pointer addressing the whole document.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a pointer string. Never fails.
    pub fn parse(path: &str) -> Self {
        if path.is_empty() {
            return Self::root();
        }

        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let segments = trimmed.split('/').map(unescape).collect();
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Split into the parent segments and the final token.
    /// Returns `None` for the root pointer.
    pub fn split_last(&self) -> Option<(&[String], &str)> {
        self.segments
            .split_last()
            .map(|(last, parent)| (parent, last.as_str()))
    }

    /// A new pointer with `segment` appended.
    pub fn join(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Look up the addressed value. Missing keys, out-of-range indices and
    /// descending into scalars all yield `None`.
    pub fn get<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(document, |current, segment| step(current, segment))
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", segment.replace('~', "~0").replace('/', "~1"))?;
        }
        Ok(())
    }
}

impl From<&str> for Pointer {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

/// Look up `path` in `document`. Shorthand for `Pointer::parse(path).get(document)`.
pub fn get<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    Pointer::parse(path).get(document)
}

/// Parse an array index token. Only plain decimal digits are accepted.
pub fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Whether a token addresses an array slot (`-` is the append position).
pub fn is_index_like(segment: &str) -> bool {
    segment == "-" || parse_index(segment).is_some()
}

fn step<'a>(current: &'a Value, segment: &str) -> Option<&'a Value> {
    match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => parse_index(segment).and_then(|i| items.get(i)),
        _ => None,
    }
}

fn unescape(segment: &str) -> String {
    if segment.contains('~') {
        segment.replace("~1", "/").replace("~0", "~")
    } else {
        segment.to_string()
    }
}
