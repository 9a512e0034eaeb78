//! Incremental compilation of one generation's stream.

use crate::apply::{apply_patch, ApplyMode};
use crate::spec::Spec;
use crate::CompileError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use specstream_patch::{Patch, PatchError, PatchParser};
use std::sync::Arc;

/// Compiler configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    pub mode: ApplyMode,
}

impl CompileOptions {
    pub fn strict() -> Self {
        Self {
            mode: ApplyMode::Strict,
        }
    }
}

/// What one [`CompilerSession::push`] produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushResult {
    /// Full snapshot after this push. Shared with the session until the next
    /// applied patch.
    pub result: Arc<Spec>,
    /// Patches parsed and applied during this push, in order.
    pub new_patches: Vec<Patch>,
}

/// Counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub lines: usize,
    pub applied: usize,
    pub dropped: usize,
}

/// Owns the document and partial-line buffer of a single generation.
///
/// Feed chunks with [`push`](Self::push) in arrival order, then call
/// [`get_result`](Self::get_result) to flush the last line. A finished session
/// rejects further input; start a new session for the next generation.
///
/// In strict mode the first bad line or failed patch finishes the session.
///
/// The typed snapshot is rebuilt only after a push touched the document;
/// pushes that end mid-line hand back the previous one.
#[derive(Debug)]
pub struct CompilerSession {
    document: Value,
    snapshot: Arc<Spec>,
    dirty: bool,
    parser: PatchParser,
    options: CompileOptions,
    stats: SessionStats,
    finished: bool,
}

impl Default for CompilerSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilerSession {
    /// A lenient session over an empty document.
    pub fn new() -> Self {
        Self::with_options(CompileOptions::default())
    }

    pub fn with_options(options: CompileOptions) -> Self {
        Self {
            document: Value::Object(Map::new()),
            snapshot: Arc::new(Spec::default()),
            dirty: false,
            parser: PatchParser::new(),
            options,
            stats: SessionStats::default(),
            finished: false,
        }
    }

    /// A session whose patches edit a previous generation's raw document,
    /// as returned by [`document`](Self::document).
    pub fn with_initial(document: Value, options: CompileOptions) -> Self {
        let mut session = Self::with_options(options);
        session.snapshot = Arc::new(Spec::from_document(&document));
        session.document = document;
        session
    }

    /// Feed a text chunk.
    pub fn push(&mut self, chunk: &str) -> Result<PushResult, CompileError> {
        self.push_bytes(chunk.as_bytes())
    }

    /// Feed a byte chunk. The chunk may end inside a UTF-8 sequence.
    pub fn push_bytes(&mut self, chunk: &[u8]) -> Result<PushResult, CompileError> {
        let new_patches = self.ingest(chunk)?;
        Ok(PushResult {
            result: self.refresh(),
            new_patches,
        })
    }

    /// Flush the buffered tail, finish the session, and return the final spec.
    /// Calling it again returns the same spec.
    pub fn get_result(&mut self) -> Result<Spec, CompileError> {
        if !self.finished {
            self.finished = true;
            if let Some(parsed) = self.parser.flush() {
                self.stats.lines = self.parser.lines_seen();
                self.apply_parsed(parsed, &mut Vec::new())?;
            }
            tracing::debug!(
                "Session finished: {} lines, {} applied, {} dropped",
                self.stats.lines,
                self.stats.applied,
                self.stats.dropped
            );
        }
        Ok(Spec::clone(&self.refresh()))
    }

    /// Consuming form of [`get_result`](Self::get_result).
    pub fn finish(mut self) -> Result<Spec, CompileError> {
        self.get_result()
    }

    /// The typed spec as of the last push.
    pub fn snapshot(&self) -> Arc<Spec> {
        Arc::clone(&self.snapshot)
    }

    /// The raw JSON document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn options(&self) -> CompileOptions {
        self.options
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Parse and apply a chunk without building a snapshot.
    pub(crate) fn ingest(&mut self, chunk: &[u8]) -> Result<Vec<Patch>, CompileError> {
        if self.finished {
            return Err(CompileError::SessionFinished);
        }

        let parsed = self.parser.push_bytes(chunk);
        self.stats.lines = self.parser.lines_seen();

        let mut applied = Vec::with_capacity(parsed.len());
        for entry in parsed {
            self.apply_parsed(entry, &mut applied)?;
        }
        Ok(applied)
    }

    fn refresh(&mut self) -> Arc<Spec> {
        if self.dirty {
            self.snapshot = Arc::new(Spec::from_document(&self.document));
            self.dirty = false;
        }
        Arc::clone(&self.snapshot)
    }

    fn apply_parsed(
        &mut self,
        parsed: Result<Patch, PatchError>,
        applied: &mut Vec<Patch>,
    ) -> Result<(), CompileError> {
        let patch = match parsed {
            Ok(patch) => patch,
            Err(err) => {
                tracing::debug!("Dropping line {}: {}", err.line, err.kind);
                return self.drop_or_fail(err.into());
            }
        };

        // A failed apply may have created parents before erroring
        self.dirty = true;
        match apply_patch(&mut self.document, &patch, self.options.mode) {
            Ok(()) => {
                self.stats.applied += 1;
                applied.push(patch);
                Ok(())
            }
            Err(err) => {
                tracing::debug!("Dropping patch: {err}");
                self.drop_or_fail(err.into())
            }
        }
    }

    fn drop_or_fail(&mut self, err: CompileError) -> Result<(), CompileError> {
        if self.options.mode == ApplyMode::Strict {
            self.finished = true;
            return Err(err);
        }
        self.stats.dropped += 1;
        Ok(())
    }
}
