//! Scanning cursor shared by every tokenizer state.
//!
//! Tracks how many input bytes the current token has consumed, how long its
//! payload is, where the payload lives, and the line/column of the next
//! character. Nothing is consumed from the input source until the next token
//! starts, so a finished token can still borrow its bytes from the source.

use miette::Diagnostic;
use thiserror::Error;
use tracing::trace;

use super::error::LexError;
use super::source::{InputSource, Peek};

/// Recoverable problems found while tokenizing. They never stop the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Diagnostic)]
pub enum LexerDiagnostic {
    #[error("Newline in string")]
    NewlineInString,
    #[error("Unterminated string went into end of file")]
    UnterminatedStringFoundEof,
    #[error("Unterminated comment went into end of file")]
    UnterminatedCommentFoundEof,
    #[error("Unterminated url went into end of file")]
    UnterminatedUrlFoundEof,
    #[error("Unexpected character in url")]
    UnexpectedCharInUrl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PosedLexerDiagnostic {
    pub diagnostic: LexerDiagnostic,
    pub line: u32,
    pub column: u32,
}

/// Line and column of the next character, both 1-based.
///
/// CR, LF, FF and CRLF each count as a single line break. Columns count
/// characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    after_cr: bool,
}

impl Position {
    pub(crate) fn start() -> Self {
        Self { line: 1, column: 1, after_cr: false }
    }

    fn advance(&mut self, ch: char) {
        match ch {
            '\n' if self.after_cr => {}
            '\n' | '\r' | '\x0C' => {
                self.line += 1;
                self.column = 1;
            }
            _ => self.column += 1,
        }
        self.after_cr = ch == '\r';
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

/// A point inside the current token that scanning can roll back to.
///
/// Restoring a bookmark undoes every consumption and payload append made
/// after it was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Bookmark {
    bytes_read: usize,
    payload_len: usize,
    position: Position,
}

/// Holds the decoded payload of tokens containing escapes.
#[derive(Debug, Default)]
pub(crate) struct EscapeBuffer {
    data: Vec<u8>,
}

impl EscapeBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, bytes: &[u8]) -> Result<(), LexError> {
        self.data.try_reserve(bytes.len())?;
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

pub(crate) struct Cursor<S> {
    source: S,
    /// Input bytes consumed by the current token.
    bytes_read: usize,
    /// Payload bytes gathered by the current token.
    payload_len: usize,
    /// Once set, the payload lives in `buffer` instead of the source window.
    escaped: bool,
    buffer: Option<EscapeBuffer>,
    position: Position,
    token_start: Position,
    /// Absolute byte offset of the current token.
    offset: usize,
    diagnostics: Vec<PosedLexerDiagnostic>,
}

impl<S: InputSource> Cursor<S> {
    pub(crate) fn new(source: S) -> Self {
        Self {
            source,
            bytes_read: 0,
            payload_len: 0,
            escaped: false,
            buffer: None,
            position: Position::start(),
            token_start: Position::start(),
            offset: 0,
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn source(&self) -> &S {
        &self.source
    }

    pub(crate) fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub(crate) fn position(&self) -> Position {
        self.position
    }

    pub(crate) fn token_start(&self) -> Position {
        self.token_start
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    pub(crate) fn is_escaped(&self) -> bool {
        self.escaped
    }

    /// Consumes the previous token from the source and starts a new one.
    pub(crate) fn begin_token(&mut self) {
        if self.bytes_read > 0 {
            self.source.advance(self.bytes_read);
            self.offset += self.bytes_read;
        }
        self.bytes_read = 0;
        self.payload_len = 0;
        if self.escaped {
            if let Some(buffer) = self.buffer.as_mut() {
                buffer.truncate(0);
            }
            self.escaped = false;
        }
        self.token_start = self.position;
    }

    /// Peeks the character after everything consumed so far.
    /// `None` means end of input.
    pub(crate) fn peek(&mut self) -> Result<Option<char>, LexError> {
        match self.source.peek(self.bytes_read)? {
            Peek::Char(ch) => Ok(Some(ch)),
            Peek::Eof => Ok(None),
        }
    }

    /// Consumes `ch` (the peeked character) and adds it to the payload.
    pub(crate) fn append(&mut self, ch: char) -> Result<(), LexError> {
        if self.escaped {
            let mut utf8 = [0; 4];
            self.escape_buffer().append(ch.encode_utf8(&mut utf8).as_bytes())?;
        }
        self.payload_len += ch.len_utf8();
        self.consume(ch);
        Ok(())
    }

    /// Consumes `ch` without adding it to the payload. Only possible once the
    /// payload has moved into the escape buffer.
    pub(crate) fn skip(&mut self, ch: char) {
        debug_assert!(self.escaped, "skipping input while the payload borrows the source");
        self.consume(ch);
    }

    /// Adds a decoded character to the payload without consuming input.
    pub(crate) fn push_decoded(&mut self, ch: char) -> Result<(), LexError> {
        debug_assert!(self.escaped);
        let mut utf8 = [0; 4];
        self.escape_buffer().append(ch.encode_utf8(&mut utf8).as_bytes())?;
        self.payload_len += ch.len_utf8();
        Ok(())
    }

    /// Moves the payload gathered so far into the escape buffer. All later
    /// payload bytes of this token go there too.
    pub(crate) fn rehome(&mut self) -> Result<(), LexError> {
        if self.escaped {
            return Ok(());
        }
        debug_assert_eq!(self.payload_len, self.bytes_read);
        let buffer = self.buffer.get_or_insert_with(EscapeBuffer::new);
        buffer.truncate(0);
        buffer.append(self.source.window(self.payload_len))?;
        self.escaped = true;
        Ok(())
    }

    pub(crate) fn mark(&self) -> Bookmark {
        Bookmark {
            bytes_read: self.bytes_read,
            payload_len: self.payload_len,
            position: self.position,
        }
    }

    pub(crate) fn restore(&mut self, mark: Bookmark) {
        debug_assert!(mark.bytes_read <= self.bytes_read);
        trace!(
            from = self.bytes_read,
            to = mark.bytes_read,
            "rolling back speculative input"
        );
        self.bytes_read = mark.bytes_read;
        self.payload_len = mark.payload_len;
        self.position = mark.position;
        if self.escaped {
            self.escape_buffer().truncate(mark.payload_len);
        }
    }

    /// The current token's payload, before any decoration is stripped.
    pub(crate) fn payload(&self) -> &[u8] {
        match (&self.buffer, self.escaped) {
            (Some(buffer), true) => &buffer.as_bytes()[..self.payload_len],
            _ => self.source.window(self.payload_len),
        }
    }

    pub(crate) fn report(&mut self, diagnostic: LexerDiagnostic) {
        self.diagnostics.push(PosedLexerDiagnostic {
            diagnostic,
            line: self.position.line,
            column: self.position.column,
        });
    }

    pub(crate) fn take_diagnostics(&mut self) -> Vec<PosedLexerDiagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    fn consume(&mut self, ch: char) {
        self.bytes_read += ch.len_utf8();
        self.position.advance(ch);
    }

    fn escape_buffer(&mut self) -> &mut EscapeBuffer {
        self.buffer.get_or_insert_with(EscapeBuffer::new)
    }
}
