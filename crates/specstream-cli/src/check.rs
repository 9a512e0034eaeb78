//! `specstream check`: every problem in a stream, not just the first.

use serde_json::Value;
use specstream_compiler::{apply_patch, ApplyError, ApplyMode, Spec, SpecIssue};
use specstream_patch::{PatchError, PatchParser};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Problem {
    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error("Apply error at line {line}: {error}")]
    Apply { line: usize, error: ApplyError },

    #[error("Spec issue: {0}")]
    Spec(#[from] SpecIssue),
}

/// Parse and apply `source` strictly, collecting every error, then validate
/// the resulting spec. Failed patches leave the document untouched and
/// checking continues with the next line.
pub fn check(source: &str) -> Vec<Problem> {
    let mut problems = Vec::new();
    let mut document = Value::Object(Default::default());

    let mut parser = PatchParser::new();
    let mut parsed = parser.push_numbered(source.as_bytes());
    parsed.extend(parser.flush_numbered());

    for (line, entry) in parsed {
        match entry {
            Ok(patch) => {
                if let Err(error) = apply_patch(&mut document, &patch, ApplyMode::Strict) {
                    problems.push(Problem::Apply { line, error });
                }
            }
            Err(e) => problems.push(e.into()),
        }
    }

    let spec = Spec::from_document(&document);
    problems.extend(spec.validate().into_iter().map(Problem::from));
    problems
}
