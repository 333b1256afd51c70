#![allow(clippy::needless_return)]
#![allow(clippy::new_without_default)]

pub mod config;
pub mod logging;
pub mod tokenizer;

pub use config::LexerConfig;
pub use tokenizer::{tokenize, tokenize_with, LexError, Lexer, Token, TokenKind};
