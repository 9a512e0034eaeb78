//! The patch wire type and single-line parsing.

use crate::{PatchError, PatchErrorKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Patch operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    /// Insert at the path; appends when the target (or its parent) is an array.
    Add,
    /// Write at the path, creating missing containers.
    Set,
    /// Overwrite at the path if its parent already exists.
    Replace,
    /// Delete the path if present.
    Remove,
}

impl PatchOp {
    pub fn as_str(self) -> &'static str {
        match self {
            PatchOp::Add => "add",
            PatchOp::Set => "set",
            PatchOp::Replace => "replace",
            PatchOp::Remove => "remove",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "add" => Some(PatchOp::Add),
            "set" => Some(PatchOp::Set),
            "replace" => Some(PatchOp::Replace),
            "remove" => Some(PatchOp::Remove),
            _ => None,
        }
    }

    /// Whether the op carries a `value`.
    pub fn takes_value(self) -> bool {
        !matches!(self, PatchOp::Remove)
    }
}

impl fmt::Display for PatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One streamed mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub op: PatchOp,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Patch {
    pub fn new(op: PatchOp, path: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            op,
            path: path.into(),
            value,
        }
    }

    pub fn add(path: impl Into<String>, value: Value) -> Self {
        Self::new(PatchOp::Add, path, Some(value))
    }

    pub fn set(path: impl Into<String>, value: Value) -> Self {
        Self::new(PatchOp::Set, path, Some(value))
    }

    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        Self::new(PatchOp::Replace, path, Some(value))
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self::new(PatchOp::Remove, path, None)
    }

    /// Validate an already-decoded JSON value as a patch.
    pub fn from_json(value: Value) -> Result<Self, PatchErrorKind> {
        let Value::Object(mut map) = value else {
            return Err(PatchErrorKind::NotAnObject);
        };

        let op = match map.get("op") {
            Some(Value::String(name)) => {
                PatchOp::from_name(name).ok_or_else(|| PatchErrorKind::UnknownOp(name.clone()))?
            }
            _ => return Err(PatchErrorKind::MissingOp),
        };

        let path = match map.remove("path") {
            Some(Value::String(path)) => path,
            _ => return Err(PatchErrorKind::MissingPath),
        };

        let value = map.remove("value");
        if op.takes_value() && value.is_none() {
            return Err(PatchErrorKind::MissingValue(op));
        }

        Ok(Self { op, path, value })
    }

    /// Serialize to a single SpecStream line (no trailing newline).
    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Parse one line. Blank lines yield `Ok(None)`.
/// `line` is the 1-based stream line number used in the error.
pub fn parse_line(text: &str, line: usize) -> Result<Option<Patch>, PatchError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(text).map_err(|e| PatchError {
        kind: PatchErrorKind::Json(e.to_string()),
        line,
    })?;

    Patch::from_json(value)
        .map(Some)
        .map_err(|kind| PatchError { kind, line })
}

/// Parse a complete SpecStream text, silently dropping malformed lines.
pub fn parse_patches(text: &str) -> Vec<Patch> {
    text.lines()
        .enumerate()
        .filter_map(|(i, line)| parse_line(line, i + 1).ok().flatten())
        .collect()
}
