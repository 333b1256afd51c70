use std::ops::Range;

use super::chars::is_whitespace_byte;
use super::TokenKind;

/// Strips the syntactic decoration of a finished token off its raw payload.
///
/// `closed` tells whether a quoted construct ended with its closing quote: a
/// string cut off by the end of input has no quote to strip, and a `url()`
/// with a quoted body carries both quotes.
pub(crate) fn strip(kind: TokenKind, payload: &[u8], closed: bool) -> Range<usize> {
    use TokenKind::*;

    let mut start = 0;
    let mut end = payload.len();
    match kind {
        AtKeyword | Hash | InvalidString => start = 1,
        String => {
            start = 1;
            if closed {
                end = end.saturating_sub(1);
            }
        }
        Percentage | Function => end = end.saturating_sub(1),
        UnicodeRange | Comment => {
            start = 2;
            if kind == Comment {
                end = end.saturating_sub(2);
            }
        }
        Uri => {
            start = "url(".len();
            end = end.saturating_sub(1);
            while start < end && is_whitespace_byte(payload[start]) {
                start += 1;
            }
            while end > start && is_whitespace_byte(payload[end - 1]) {
                end -= 1;
            }
            if closed && end > start {
                start += 1;
                end -= 1;
            }
        }
        Eof => end = 0,
        _ => {}
    }
    start.min(payload.len())..end.max(start).min(payload.len())
}
