use std::collections::TryReserveError;

use miette::Diagnostic;
use thiserror::Error;

use super::source::SourceError;

/// Errors returned by [`Lexer::next_token`](super::Lexer::next_token).
///
/// Malformed CSS is never an error: it is recovered into an alternate token
/// kind. Only `NeedData` is recoverable, by pushing more input and calling
/// again.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum LexError {
    #[error("more input is needed to finish the current token")]
    #[diagnostic(help("push more data into the input source and call `next_token` again"))]
    NeedData,
    #[error("input source fault: {0}")]
    Fault(String),
    #[error("out of memory while growing the escape buffer")]
    OutOfMemory,
}

impl LexError {
    /// Whether the lexer can be called again after this error.
    pub fn is_resumable(&self) -> bool {
        matches!(self, LexError::NeedData)
    }
}

impl From<SourceError> for LexError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NeedData => LexError::NeedData,
            SourceError::Fault(msg) => LexError::Fault(msg),
        }
    }
}

impl From<TryReserveError> for LexError {
    fn from(_: TryReserveError) -> Self {
        LexError::OutOfMemory
    }
}
