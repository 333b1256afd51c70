//! Character classes of the CSS 2.1 tokenizer grammar.
//!
//! A backslash is never classified here: whether it starts a valid escape
//! depends on the character after it and is decided by the escape decoder.

pub(crate) const REPLACEMENT_CHAR: char = '\u{FFFD}';

/// `[ \t\r\n\f]`
#[inline]
pub(crate) fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\x0C')
}

/// Byte form of [`is_whitespace`], for stripping finished payloads.
#[inline]
pub(crate) fn is_whitespace_byte(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0C)
}

#[inline]
pub(crate) fn is_newline(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\x0C')
}

#[inline]
pub(crate) fn is_digit(ch: char) -> bool {
    ch.is_ascii_digit()
}

#[inline]
pub(crate) fn is_hex(ch: char) -> bool {
    ch.is_ascii_hexdigit()
}

/// `nmstart` without the escape alternative: `[_a-zA-Z]|{nonascii}`
#[inline]
pub(crate) fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || !ch.is_ascii()
}

/// `nmchar` without the escape alternative: `[_a-zA-Z0-9-]|{nonascii}`
#[inline]
pub(crate) fn is_name_char(ch: char) -> bool {
    is_name_start(ch) || is_digit(ch) || ch == '-'
}

/// Characters that may appear verbatim in a string delimited by `quote`.
/// The other quote character is string content.
#[inline]
pub(crate) fn is_string_char(ch: char, quote: char) -> bool {
    ch != quote && ch != '\\' && !is_newline(ch)
}

/// `[\t!#$%&*-~]|{nonascii}` minus the backslash.
#[inline]
pub(crate) fn is_url_char(ch: char) -> bool {
    match ch {
        '\\' => false,
        '\t' | '!' | '#'..='&' | '*'..='~' => true,
        _ => !ch.is_ascii(),
    }
}
