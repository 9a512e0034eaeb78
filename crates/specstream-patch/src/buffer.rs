//! Chunk assembly: streamed bytes become complete lines, and lines become
//! patches tagged with their 1-based line numbers.

use crate::patch::{parse_line, Patch};
use crate::PatchError;

/// A parse outcome paired with the line it came from.
pub type NumberedPatch = (usize, Result<Patch, PatchError>);

/// Accumulates streamed bytes and hands out complete lines.
///
/// Splitting happens on raw `\n` bytes, which never occur inside a multi-byte
/// UTF-8 sequence, so a chunk boundary may fall anywhere, including in the
/// middle of a character. A trailing `\r` is trimmed from every line.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
    lines_emitted: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text chunk and return every line it completed.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        self.push_bytes(chunk.as_bytes())
    }

    /// Append a byte chunk and return every line it completed.
    pub fn push_bytes(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let Some(last_newline) = self.pending.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };

        let rest = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, rest);

        let lines: Vec<String> = complete[..complete.len() - 1]
            .split(|&b| b == b'\n')
            .map(decode_line)
            .collect();
        self.lines_emitted += lines.len();
        lines
    }

    /// Take whatever is buffered as a final line, even without a trailing newline.
    pub fn flush(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = decode_line(&std::mem::take(&mut self.pending));
        self.lines_emitted += 1;
        Some(line)
    }

    /// Bytes waiting for a newline.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Number of lines handed out so far (also the number of the last line).
    pub fn lines_emitted(&self) -> usize {
        self.lines_emitted
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Incremental SpecStream parser: a [`LineBuffer`] feeding [`parse_line`].
///
/// Every complete non-blank line yields one entry, either the parsed patch or
/// the reason it was rejected. Callers decide whether rejected lines are
/// dropped or reported.
#[derive(Debug, Default)]
pub struct PatchParser {
    buffer: LineBuffer,
}

impl PatchParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a text chunk.
    pub fn push(&mut self, chunk: &str) -> Vec<Result<Patch, PatchError>> {
        self.push_bytes(chunk.as_bytes())
    }

    /// Feed a byte chunk.
    pub fn push_bytes(&mut self, chunk: &[u8]) -> Vec<Result<Patch, PatchError>> {
        self.push_numbered(chunk).into_iter().map(|(_, parsed)| parsed).collect()
    }

    /// Feed a byte chunk, keeping the line number of every entry, including
    /// the ones that parsed.
    pub fn push_numbered(&mut self, chunk: &[u8]) -> Vec<NumberedPatch> {
        let first_line = self.buffer.lines_emitted() + 1;
        self.buffer
            .push_bytes(chunk)
            .iter()
            .enumerate()
            .filter_map(|(i, line)| {
                let number = first_line + i;
                parse_line(line, number).transpose().map(|parsed| (number, parsed))
            })
            .collect()
    }

    /// Parse the buffered tail as a final line.
    pub fn flush(&mut self) -> Option<Result<Patch, PatchError>> {
        self.flush_numbered().map(|(_, parsed)| parsed)
    }

    /// [`flush`](Self::flush) with the tail's line number.
    pub fn flush_numbered(&mut self) -> Option<NumberedPatch> {
        let line = self.buffer.flush()?;
        let number = self.buffer.lines_emitted();
        parse_line(&line, number).transpose().map(|parsed| (number, parsed))
    }

    /// Number of lines consumed so far.
    pub fn lines_seen(&self) -> usize {
        self.buffer.lines_emitted()
    }

    /// Whether a partial line is waiting for more input.
    pub fn has_pending(&self) -> bool {
        !self.buffer.pending().is_empty()
    }
}
