use super::chars::{is_newline, is_whitespace, REPLACEMENT_CHAR};
use super::cursor::Cursor;
use super::error::LexError;
use super::source::InputSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EscapeMode {
    /// Identifiers, urls, units: a newline after `\` is not an escape.
    Plain,
    /// Strings: `\` followed by a newline is a line continuation.
    Newline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Escape {
    Decoded,
    /// Not an escape; nothing was consumed.
    Invalid,
}

/// Consumes an escape sequence. The next character must be the `\`.
///
/// Either the whole escape is consumed or nothing is: on `Invalid` and on
/// errors (including [`LexError::NeedData`]) the cursor is back in front of
/// the backslash. The payload moves into the escape buffer in any case.
pub(crate) fn consume_escape<S: InputSource>(
    cur: &mut Cursor<S>,
    mode: EscapeMode,
) -> Result<Escape, LexError> {
    let mark = cur.mark();
    match decode(cur, mode) {
        Ok(Escape::Decoded) => Ok(Escape::Decoded),
        Ok(Escape::Invalid) => {
            cur.restore(mark);
            Ok(Escape::Invalid)
        }
        Err(err) => {
            cur.restore(mark);
            Err(err)
        }
    }
}

fn decode<S: InputSource>(cur: &mut Cursor<S>, mode: EscapeMode) -> Result<Escape, LexError> {
    cur.rehome()?;
    cur.skip('\\');

    let Some(ch) = cur.peek()? else {
        return Ok(Escape::Invalid);
    };

    if is_newline(ch) {
        if mode == EscapeMode::Plain {
            return Ok(Escape::Invalid);
        }
        cur.skip(ch);
        skip_lf_after_cr(cur, ch)?;
        return Ok(Escape::Decoded);
    }

    if let Some(digit) = ch.to_digit(16) {
        cur.skip(ch);
        let mut value = digit;
        for _ in 1..6 {
            let Some((h, digit)) = cur.peek()?.and_then(|h| Some((h, h.to_digit(16)?))) else {
                break;
            };
            value = (value << 4) | digit;
            cur.skip(h);
        }
        cur.push_decoded(sanitize(value))?;

        // a single whitespace after the digits belongs to the escape
        if let Some(ws) = cur.peek()?.filter(|&ws| is_whitespace(ws)) {
            cur.skip(ws);
            skip_lf_after_cr(cur, ws)?;
        }
        return Ok(Escape::Decoded);
    }

    cur.append(ch)?;
    Ok(Escape::Decoded)
}

fn skip_lf_after_cr<S: InputSource>(cur: &mut Cursor<S>, prev: char) -> Result<(), LexError> {
    if prev == '\r' && cur.peek()? == Some('\n') {
        cur.skip('\n');
    }
    Ok(())
}

/// Maps a decoded codepoint to the character appended to the payload.
pub(crate) fn sanitize(value: u32) -> char {
    let forbidden = value > 0x10FFFF
        || value <= 0x0008
        || value == 0x000B
        || (0x000E..=0x001F).contains(&value)
        || (0x007F..=0x009F).contains(&value)
        || (0xD800..=0xDFFF).contains(&value)
        || (0xFDD0..=0xFDEF).contains(&value)
        || value & 0xFFFE == 0xFFFE;
    if forbidden {
        return REPLACEMENT_CHAR;
    }
    if value == 0x000D {
        return '\n';
    }
    char::from_u32(value).unwrap_or(REPLACEMENT_CHAR)
}
