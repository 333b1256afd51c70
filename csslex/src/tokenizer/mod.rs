//! A resumable css lexer following the [CSS 2.1 tokenizer grammar](https://www.w3.org/TR/CSS21/syndata.html#tokenization)
//! with some notable properties:
//! - input is pulled from an [`InputSource`]; a source that runs dry reports `NeedData`,
//!     and the lexer continues exactly where it stopped once more input was pushed
//! - tokens borrow their payload from the input whenever possible; a token containing
//!     escapes is decoded into a buffer owned by the lexer
//! - malformed input never fails: ambiguous prefixes are rolled back and
//!     reinterpreted as a shorter token (`url(` without `)` becomes a `Function`, etc.)
//! - comments are skipped unless `emit_comments` is configured

mod chars;
mod cursor;
mod error;
mod escape;
mod finalize;
mod scanner;
mod source;
mod test;

use std::borrow::Cow;

use serde::Serialize;
use strum::{Display, EnumIter, IntoStaticStr};
use tracing::{debug, trace};

use crate::config::LexerConfig;
use cursor::Cursor;
use scanner::{State, Step};

pub use cursor::{LexerDiagnostic, PosedLexerDiagnostic, Position};
pub use error::LexError;
pub use source::{InputSource, Peek, SourceError, StrInput, StreamInput};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr, Serialize)]
pub enum TokenKind {
    /// `@` ident
    ///
    /// The value does not include the `@` marker.
    AtKeyword,

    /// The value does not include the quotes.
    String,

    /// A string cut short by a newline. The value does not include the opening quote.
    InvalidString,

    /// `#` name
    ///
    /// The value does not include the `#` marker.
    Hash,

    Number,

    /// The value does not include the `%` sign.
    Percentage,

    /// A number immediately followed by an identifier. The value includes the unit.
    Dimension,

    /// `<!--`
    Cdo,

    /// `-->`
    Cdc,

    Whitespace,

    /// The value does not include the `/*` `*/` markers.
    Comment,

    /// `~=`
    Includes,

    /// `|=`
    DashMatch,

    /// `^=`
    PrefixMatch,

    /// `$=`
    SuffixMatch,

    /// `*=`
    SubstringMatch,

    /// `url(...)`
    ///
    /// The value does not include the `url(` `)` markers, the whitespace around
    /// the address, nor its quotes.
    Uri,

    Ident,

    /// The value (name) does not include the `(` marker.
    Function,

    /// `u+`
    ///
    /// The value does not include the `u+` marker.
    UnicodeRange,

    /// Any other single character.
    Char,

    /// End of input
    Eof,
}

/// A token borrowed from the lexer. It stays valid until the next call to
/// [`Lexer::next_token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Payload with the per-kind decoration stripped.
    pub data: &'a [u8],
    /// Position of the first character of the token.
    pub line: u32,
    pub column: u32,
    /// Byte offset of the first byte of the token in the whole input. Comments
    /// skipped right before the token belong to its span.
    pub offset: usize,
    /// Number of input bytes the token consumed, skipped comments included.
    pub raw_len: usize,
    /// The payload was decoded into the escape buffer instead of borrowing the input.
    pub escaped: bool,
}

impl<'a> Token<'a> {
    pub fn text(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.data)
    }

    pub fn to_owned_token(&self) -> OwnedToken {
        OwnedToken {
            kind: self.kind,
            text: self.text().into_owned(),
            line: self.line,
            column: self.column,
            offset: self.offset,
            len: self.raw_len,
            escaped: self.escaped,
        }
    }
}

/// A token that does not borrow from the lexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnedToken {
    pub kind: TokenKind,
    pub text: String,
    pub line: u32,
    pub column: u32,
    pub offset: usize,
    pub len: usize,
    pub escaped: bool,
}

pub struct Lexer<S> {
    cursor: Cursor<S>,
    state: State,
    config: LexerConfig,
    /// Bytes of comments skipped since the last emitted token.
    skipped: usize,
}

impl<S: InputSource> Lexer<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, LexerConfig::default())
    }

    pub fn with_config(source: S, config: LexerConfig) -> Self {
        debug!(?config, "creating lexer");
        Self {
            cursor: Cursor::new(source),
            state: State::Start,
            config,
            skipped: 0,
        }
    }

    pub fn config(&self) -> &LexerConfig {
        &self.config
    }

    pub fn set_emit_comments(&mut self, emit_comments: bool) {
        self.config.emit_comments = emit_comments;
    }

    pub fn source(&self) -> &S {
        self.cursor.source()
    }

    /// Gives access to the input, e.g. to push more data after a `NeedData`.
    pub fn source_mut(&mut self) -> &mut S {
        self.cursor.source_mut()
    }

    /// Position of the next character the lexer will look at.
    pub fn position(&self) -> Position {
        self.cursor.position()
    }

    pub fn take_diagnostics(&mut self) -> Vec<PosedLexerDiagnostic> {
        self.cursor.take_diagnostics()
    }

    /// Scans the next token.
    ///
    /// At the end of input an `Eof` token is returned, as many times as this is
    /// called. On [`LexError::NeedData`] everything scanned so far is kept;
    /// call again once the source has more data.
    pub fn next_token(&mut self) -> Result<Token<'_>, LexError> {
        let finish = loop {
            if self.state.is_start() {
                self.cursor.begin_token();
            }
            match self.state.step(&mut self.cursor)? {
                Step::Goto(next) => self.state = next,
                Step::Emit(finish) => {
                    self.state = State::Start;
                    if finish.kind == TokenKind::Comment && !self.config.emit_comments {
                        trace!(offset = self.cursor.offset(), "skipping comment");
                        self.skipped += self.cursor.bytes_read();
                        continue;
                    }
                    break finish;
                }
            }
        };

        let payload = self.cursor.payload();
        let range = finalize::strip(finish.kind, payload, finish.closed);
        let start = self.cursor.token_start();
        let skipped = std::mem::take(&mut self.skipped);
        trace!(kind = %finish.kind, line = start.line, column = start.column, "token");
        Ok(Token {
            kind: finish.kind,
            data: &payload[range],
            line: start.line,
            column: start.column,
            offset: self.cursor.offset() - skipped,
            raw_len: self.cursor.bytes_read() + skipped,
            escaped: self.cursor.is_escaped(),
        })
    }
}

/// Tokenizes the input string slice, stopping before the end of input.
pub fn tokenize(input: &str) -> Tokens<'_> {
    tokenize_with(input, LexerConfig::default())
}

pub fn tokenize_with(input: &str, config: LexerConfig) -> Tokens<'_> {
    Tokens {
        lexer: Lexer::with_config(StrInput::new(input), config),
        done: false,
    }
}

/// Iterator returned by [`tokenize`].
pub struct Tokens<'a> {
    lexer: Lexer<StrInput<'a>>,
    done: bool,
}

impl Tokens<'_> {
    pub fn take_diagnostics(&mut self) -> Vec<PosedLexerDiagnostic> {
        self.lexer.take_diagnostics()
    }
}

impl Iterator for Tokens<'_> {
    type Item = Result<OwnedToken, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.lexer.next_token() {
            Ok(token) if token.kind == TokenKind::Eof => {
                self.done = true;
                None
            }
            Ok(token) => Some(Ok(token.to_owned_token())),
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
