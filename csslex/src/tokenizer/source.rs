//! Input sources feeding the lexer.
//!
//! A source is a window of UTF-8 text starting at a consumption cursor. The
//! lexer looks ahead with `peek` without consuming anything and calls
//! `advance` once per token, at the start of the following token, so the
//! bytes of the token it just returned stay readable through `window`.

use miette::Diagnostic;
use thiserror::Error;

/// Result of looking at one character of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Peek {
    Char(char),
    /// No more input will ever arrive.
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum SourceError {
    /// The source has no data at the requested offset yet, but more may be pushed.
    #[error("input source needs more data")]
    NeedData,
    #[error("input source fault: {0}")]
    Fault(String),
}

pub trait InputSource {
    /// Looks at the character starting `offset` bytes past the cursor.
    ///
    /// `offset` is always on a character boundary previously reported by `peek`.
    fn peek(&mut self, offset: usize) -> Result<Peek, SourceError>;

    /// The first `len` bytes past the cursor. Only called for bytes that were
    /// already returned by `peek`.
    fn window(&self, len: usize) -> &[u8];

    /// Consumes `n` bytes. Offsets handed to `peek` are relative to the new cursor afterwards.
    fn advance(&mut self, n: usize);
}

/// A complete, borrowed input.
#[derive(Debug, Clone)]
pub struct StrInput<'a> {
    input: &'a str,
    cursor: usize,
}

impl<'a> StrInput<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, cursor: 0 }
    }

    /// Input that has not been consumed yet.
    pub fn remaining(&self) -> &'a str {
        &self.input[self.cursor..]
    }
}

impl InputSource for StrInput<'_> {
    fn peek(&mut self, offset: usize) -> Result<Peek, SourceError> {
        let ch = self
            .input
            .get(self.cursor + offset..)
            .and_then(|rest| rest.chars().next());
        Ok(ch.map_or(Peek::Eof, Peek::Char))
    }

    fn window(&self, len: usize) -> &[u8] {
        &self.input.as_bytes()[self.cursor..self.cursor + len]
    }

    fn advance(&mut self, n: usize) {
        self.cursor = (self.cursor + n).min(self.input.len());
    }
}

/// Consumed prefixes shorter than this are never compacted away.
const COMPACT_THRESHOLD: usize = 4096;

/// An input that grows over time.
///
/// Until [`finish`](StreamInput::finish) is called, running out of buffered
/// text is reported as [`SourceError::NeedData`] instead of end of input.
#[derive(Debug, Clone, Default)]
pub struct StreamInput {
    buffer: String,
    cursor: usize,
    finished: bool,
}

impl StreamInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &str) {
        debug_assert!(!self.finished, "pushed data into a finished stream");
        self.buffer.push_str(chunk);
    }

    /// Marks the end of the input.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of buffered bytes not consumed yet.
    pub fn buffered(&self) -> usize {
        self.buffer.len() - self.cursor
    }
}

impl InputSource for StreamInput {
    fn peek(&mut self, offset: usize) -> Result<Peek, SourceError> {
        let ch = self
            .buffer
            .get(self.cursor + offset..)
            .and_then(|rest| rest.chars().next());
        match ch {
            Some(ch) => Ok(Peek::Char(ch)),
            None if self.finished => Ok(Peek::Eof),
            None => Err(SourceError::NeedData),
        }
    }

    fn window(&self, len: usize) -> &[u8] {
        &self.buffer.as_bytes()[self.cursor..self.cursor + len]
    }

    fn advance(&mut self, n: usize) {
        self.cursor = (self.cursor + n).min(self.buffer.len());
        if self.cursor >= COMPACT_THRESHOLD && self.cursor * 2 >= self.buffer.len() {
            self.buffer.drain(..self.cursor);
            self.cursor = 0;
        }
    }
}
