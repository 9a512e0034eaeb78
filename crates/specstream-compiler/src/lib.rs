//! SpecStream Compiler
//!
//! Builds a [`Spec`] from a SpecStream: newline-delimited JSON patches that
//! arrive in arbitrary chunks while a producer is still generating them.
//! The document is queryable after every chunk.
//!
//! ```text
//! chunks → PatchParser → apply_patch → document → Spec
//! ```
//!
//! # Example
//!
//! ```
//! use specstream_compiler::CompilerSession;
//!
//! let mut session = CompilerSession::new();
//! session.push("{\"op\":\"add\",\"path\":\"/root\",\"value\":\"card\"}\n{\"op\":\"add\",").unwrap();
//! session.push("\"path\":\"/elements/card\",\"value\":{\"type\":\"Card\"}}").unwrap();
//! let spec = session.get_result().unwrap();
//! assert_eq!(spec.root_element().unwrap().element_type, "Card");
//! ```

pub mod apply;
pub mod binding;
pub mod session;
pub mod spec;

pub use apply::{apply_patch, apply_patches, ApplyError, ApplyMode};
pub use binding::{Comparator, Comparison, Condition, PropValue, Visibility};
pub use session::{CompileOptions, CompilerSession, PushResult, SessionStats};
pub use spec::{Element, ElementKey, Repeat, Spec, SpecIssue};

pub use specstream_patch::{Patch, PatchError, PatchOp};

/// Compilation error.
///
/// Lenient sessions only ever return [`CompileError::SessionFinished`]; the
/// other variants come from strict mode.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error("Apply error: {0}")]
    Apply(#[from] ApplyError),

    #[error("Session already finished; start a new session for the next generation")]
    SessionFinished,
}

/// Compile a complete SpecStream text leniently.
pub fn compile(text: &str) -> Spec {
    compile_with(text, CompileOptions::default()).unwrap_or_default()
}

/// Compile a complete SpecStream text with explicit options.
pub fn compile_with(text: &str, options: CompileOptions) -> Result<Spec, CompileError> {
    let mut session = CompilerSession::with_options(options);
    session.ingest(text.as_bytes())?;
    session.get_result()
}
