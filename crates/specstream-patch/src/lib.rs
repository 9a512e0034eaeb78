//! SpecStream Patch Parser
//!
//! Turns raw streamed text into patch operations.
//! Handles chunk boundaries that fall mid-line (or mid-character), blank lines,
//! and malformed lines. Each complete line is one JSON patch object:
//!
//! ```text
//! {"op":"add","path":"/elements/card-1","value":{"type":"Card","props":{}}}
//! {"op":"set","path":"/root","value":"card-1"}
//! ```
//!
//! # Example
//!
//! ```
//! use specstream_patch::PatchParser;
//!
//! let mut parser = PatchParser::new();
//! assert!(parser.push("{\"op\":\"set\",\"pa").is_empty());
//! let parsed = parser.push("th\":\"/root\",\"value\":\"a\"}\n");
//! assert_eq!(parsed.len(), 1);
//! ```

pub mod buffer;
pub mod patch;
pub mod pointer;

pub use buffer::{LineBuffer, NumberedPatch, PatchParser};
pub use patch::{parse_line, parse_patches, Patch, PatchOp};
pub use pointer::Pointer;

/// Patch parse error with the 1-based line number in the stream.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Patch error at line {line}: {kind}")]
pub struct PatchError {
    pub kind: PatchErrorKind,
    pub line: usize,
}

/// What was wrong with a line.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatchErrorKind {
    #[error("invalid JSON: {0}")]
    Json(String),

    #[error("expected a JSON object")]
    NotAnObject,

    #[error("missing or non-string \"op\"")]
    MissingOp,

    #[error("unknown op \"{0}\"")]
    UnknownOp(String),

    #[error("missing or non-string \"path\"")]
    MissingPath,

    #[error("op \"{0}\" requires a \"value\"")]
    MissingValue(PatchOp),
}
