//! The tokenizer state machine.
//!
//! Every top-level state owns its sub-state and whatever context it needs to
//! roll back. A state handler either finishes a token, hands over to another
//! state, or returns an error. On [`LexError::NeedData`] the handler leaves its
//! sub-state pointing at the step to retry, so the next call picks up exactly
//! where this one stopped.

use super::chars::{
    is_digit, is_hex, is_name_char, is_name_start, is_newline, is_string_char, is_url_char,
    is_whitespace,
};
use super::cursor::{Bookmark, Cursor, LexerDiagnostic};
use super::error::LexError;
use super::escape::{consume_escape, Escape, EscapeMode};
use super::source::InputSource;
use super::TokenKind;

/// A token kind plus what the finalizer needs to know about its delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Finish {
    pub kind: TokenKind,
    pub closed: bool,
}

pub(crate) enum Step {
    Emit(Finish),
    Goto(State),
}

impl Step {
    fn emit(kind: TokenKind) -> Self {
        Step::Emit(Finish { kind, closed: false })
    }

    fn emit_closed(kind: TokenKind) -> Self {
        Step::Emit(Finish { kind, closed: true })
    }
}

#[derive(Debug, Default)]
pub(crate) enum State {
    #[default]
    Start,
    AtKeyword(AtKeywordScan),
    String(StringScan),
    Hash(HashScan),
    Number(NumberScan),
    Cdo(CdoScan),
    Cdc(CdcScan),
    Whitespace,
    Comment(CommentScan),
    Match(char),
    /// `u` or `U` seen: url, unicode range or identifier.
    Uri,
    Ident(IdentScan),
    EscapedIdent,
    Url(UrlScan),
    UnicodeRange(UnicodeRangeScan),
}

impl State {
    pub(crate) fn is_start(&self) -> bool {
        matches!(self, State::Start)
    }

    pub(crate) fn step<S: InputSource>(&mut self, cur: &mut Cursor<S>) -> Result<Step, LexError> {
        match self {
            State::Start => start(cur),
            State::AtKeyword(scan) => scan.scan(cur),
            State::String(scan) => scan.scan(cur),
            State::Hash(scan) => scan.scan(cur),
            State::Number(scan) => scan.scan(cur),
            State::Cdo(scan) => scan.scan(cur),
            State::Cdc(scan) => scan.scan(cur),
            State::Whitespace => {
                consume_whitespace(cur)?;
                Ok(Step::emit(TokenKind::Whitespace))
            }
            State::Comment(scan) => scan.scan(cur),
            State::Match(first) => match_operator(cur, *first),
            State::Uri => uri(cur),
            State::Ident(scan) => scan.scan(cur),
            State::EscapedIdent => escaped_ident(cur),
            State::Url(scan) => scan.scan(cur),
            State::UnicodeRange(scan) => scan.scan(cur),
        }
    }
}

fn start<S: InputSource>(cur: &mut Cursor<S>) -> Result<Step, LexError> {
    let Some(ch) = cur.peek()? else {
        return Ok(Step::emit(TokenKind::Eof));
    };

    if ch == '\\' {
        return Ok(Step::Goto(State::EscapedIdent));
    }

    cur.append(ch)?;
    let next = match ch {
        '@' => State::AtKeyword(AtKeywordScan::new(cur.mark())),
        '"' | '\'' => State::String(StringScan { quote: ch }),
        '#' => State::Hash(HashScan::default()),
        '0'..='9' | '.' | '+' => State::Number(NumberScan::new(ch, cur.mark())),
        '<' => State::Cdo(CdoScan::new(cur.mark())),
        '-' => State::Cdc(CdcScan::default()),
        '/' => State::Comment(CommentScan::default()),
        '~' | '|' | '^' | '$' | '*' => State::Match(ch),
        'u' | 'U' => State::Uri,
        c if is_whitespace(c) => State::Whitespace,
        c if is_name_start(c) => State::Ident(IdentScan::default()),
        _ => return Ok(Step::emit(TokenKind::Char)),
    };
    Ok(Step::Goto(next))
}

/// Consumes name characters and escapes. Stops before anything else, including
/// a backslash that does not start a valid escape.
fn consume_name<S: InputSource>(cur: &mut Cursor<S>) -> Result<(), LexError> {
    loop {
        match cur.peek()? {
            Some(ch) if is_name_char(ch) => cur.append(ch)?,
            Some('\\') => {
                if consume_escape(cur, EscapeMode::Plain)? == Escape::Invalid {
                    return Ok(());
                }
            }
            _ => return Ok(()),
        }
    }
}

fn consume_whitespace<S: InputSource>(cur: &mut Cursor<S>) -> Result<(), LexError> {
    while let Some(ch) = cur.peek()? {
        if !is_whitespace(ch) {
            break;
        }
        cur.append(ch)?;
    }
    Ok(())
}

/// How a string body ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StringEnd {
    Closed,
    Eof,
    /// Stopped in front of a bare newline.
    Newline,
}

/// Consumes a string body up to and including the closing `quote`.
fn consume_string_body<S: InputSource>(
    cur: &mut Cursor<S>,
    quote: char,
) -> Result<StringEnd, LexError> {
    loop {
        let Some(ch) = cur.peek()? else {
            return Ok(StringEnd::Eof);
        };
        if is_string_char(ch, quote) {
            cur.append(ch)?;
        } else if ch == quote {
            cur.append(ch)?;
            return Ok(StringEnd::Closed);
        } else if is_newline(ch) {
            return Ok(StringEnd::Newline);
        } else if consume_escape(cur, EscapeMode::Newline)? == Escape::Invalid {
            // a backslash right before the end of input: dropped
            cur.skip('\\');
            return Ok(StringEnd::Eof);
        }
    }
}

/// Consumes unquoted url characters and escapes.
fn consume_url_chars<S: InputSource>(cur: &mut Cursor<S>) -> Result<(), LexError> {
    loop {
        match cur.peek()? {
            Some(ch) if is_url_char(ch) => cur.append(ch)?,
            Some('\\') => {
                if consume_escape(cur, EscapeMode::Plain)? == Escape::Invalid {
                    return Ok(());
                }
            }
            _ => return Ok(()),
        }
    }
}

/// `@` [`-`] nmstart nmchar*
#[derive(Debug)]
pub(crate) struct AtKeywordScan {
    sub: AtKeywordSub,
    /// Just past the `@`.
    at: Bookmark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AtKeywordSub {
    Dash,
    NameStart,
    Name,
}

impl AtKeywordScan {
    fn new(at: Bookmark) -> Self {
        Self { sub: AtKeywordSub::Dash, at }
    }

    fn scan<S: InputSource>(&mut self, cur: &mut Cursor<S>) -> Result<Step, LexError> {
        loop {
            match self.sub {
                AtKeywordSub::Dash => {
                    if cur.peek()? == Some('-') {
                        cur.append('-')?;
                    }
                    self.sub = AtKeywordSub::NameStart;
                }
                AtKeywordSub::NameStart => {
                    let started = match cur.peek()? {
                        Some(ch) if is_name_start(ch) => {
                            cur.append(ch)?;
                            true
                        }
                        Some('\\') => consume_escape(cur, EscapeMode::Plain)? == Escape::Decoded,
                        _ => false,
                    };
                    if !started {
                        cur.restore(self.at);
                        return Ok(Step::emit(TokenKind::Char));
                    }
                    self.sub = AtKeywordSub::Name;
                }
                AtKeywordSub::Name => {
                    consume_name(cur)?;
                    return Ok(Step::emit(TokenKind::AtKeyword));
                }
            }
        }
    }
}

#[derive(Debug)]
pub(crate) struct StringScan {
    quote: char,
}

impl StringScan {
    fn scan<S: InputSource>(&mut self, cur: &mut Cursor<S>) -> Result<Step, LexError> {
        match consume_string_body(cur, self.quote)? {
            StringEnd::Closed => Ok(Step::emit_closed(TokenKind::String)),
            StringEnd::Eof => {
                cur.report(LexerDiagnostic::UnterminatedStringFoundEof);
                Ok(Step::emit(TokenKind::String))
            }
            StringEnd::Newline => {
                cur.report(LexerDiagnostic::NewlineInString);
                Ok(Step::emit(TokenKind::InvalidString))
            }
        }
    }
}

/// `#` nmchar+
#[derive(Debug, Default)]
pub(crate) struct HashScan {
    started: bool,
}

impl HashScan {
    fn scan<S: InputSource>(&mut self, cur: &mut Cursor<S>) -> Result<Step, LexError> {
        if !self.started {
            let started = match cur.peek()? {
                Some(ch) if is_name_char(ch) => {
                    cur.append(ch)?;
                    true
                }
                Some('\\') => consume_escape(cur, EscapeMode::Plain)? == Escape::Decoded,
                _ => false,
            };
            if !started {
                return Ok(Step::emit(TokenKind::Char));
            }
            self.started = true;
        }
        consume_name(cur)?;
        Ok(Step::emit(TokenKind::Hash))
    }
}

/// `[+-]? ([0-9]+ | [0-9]* '.' [0-9]+)` followed by `%` or a unit.
#[derive(Debug)]
pub(crate) struct NumberScan {
    sub: NumberSub,
    /// Just past the first character (sign, dot or digit).
    lead: Bookmark,
    digits: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberSub {
    Integer,
    Dot,
    /// `dot` is where to roll back to if no digit follows; `None` when the
    /// number itself started with the dot.
    Fraction { dot: Option<Bookmark>, count: usize },
    Suffix,
    UnitDash { dash: Bookmark },
    Unit,
}

impl NumberScan {
    /// `first` has been consumed already. `lead` is the bookmark just after it.
    pub(crate) fn new(first: char, lead: Bookmark) -> Self {
        let (sub, digits) = match first {
            '0'..='9' => (NumberSub::Integer, 1),
            '.' => (NumberSub::Fraction { dot: None, count: 0 }, 0),
            _ => (NumberSub::Integer, 0),
        };
        Self { sub, lead, digits }
    }

    fn scan<S: InputSource>(&mut self, cur: &mut Cursor<S>) -> Result<Step, LexError> {
        loop {
            match self.sub {
                NumberSub::Integer => {
                    while let Some(ch) = cur.peek()?.filter(|&ch| is_digit(ch)) {
                        cur.append(ch)?;
                        self.digits += 1;
                    }
                    self.sub = NumberSub::Dot;
                }
                NumberSub::Dot => {
                    if cur.peek()? == Some('.') {
                        let dot = cur.mark();
                        cur.append('.')?;
                        self.sub = NumberSub::Fraction { dot: Some(dot), count: 0 };
                    } else {
                        self.sub = NumberSub::Suffix;
                    }
                }
                NumberSub::Fraction { dot, count } => match cur.peek()? {
                    Some(ch) if is_digit(ch) => {
                        cur.append(ch)?;
                        self.digits += 1;
                        self.sub = NumberSub::Fraction { dot, count: count + 1 };
                    }
                    _ => {
                        if let (Some(dot), 0) = (dot, count) {
                            cur.restore(dot);
                        }
                        self.sub = NumberSub::Suffix;
                    }
                },
                NumberSub::Suffix => {
                    if self.digits == 0 {
                        // a lone sign or dot
                        cur.restore(self.lead);
                        return Ok(Step::emit(TokenKind::Char));
                    }
                    match cur.peek()? {
                        Some('%') => {
                            cur.append('%')?;
                            return Ok(Step::emit(TokenKind::Percentage));
                        }
                        Some('-') => {
                            let dash = cur.mark();
                            cur.append('-')?;
                            self.sub = NumberSub::UnitDash { dash };
                        }
                        Some(ch) if is_name_start(ch) => {
                            cur.append(ch)?;
                            self.sub = NumberSub::Unit;
                        }
                        Some('\\') => {
                            if consume_escape(cur, EscapeMode::Plain)? == Escape::Invalid {
                                return Ok(Step::emit(TokenKind::Number));
                            }
                            self.sub = NumberSub::Unit;
                        }
                        _ => return Ok(Step::emit(TokenKind::Number)),
                    }
                }
                NumberSub::UnitDash { dash } => {
                    let started = match cur.peek()? {
                        Some(ch) if is_name_start(ch) => {
                            cur.append(ch)?;
                            true
                        }
                        Some('\\') => consume_escape(cur, EscapeMode::Plain)? == Escape::Decoded,
                        _ => false,
                    };
                    if !started {
                        cur.restore(dash);
                        return Ok(Step::emit(TokenKind::Number));
                    }
                    self.sub = NumberSub::Unit;
                }
                NumberSub::Unit => {
                    consume_name(cur)?;
                    return Ok(Step::emit(TokenKind::Dimension));
                }
            }
        }
    }
}

/// `<!--`
#[derive(Debug)]
pub(crate) struct CdoScan {
    matched: usize,
    /// Just past the `<`.
    lt: Bookmark,
}

impl CdoScan {
    const TAIL: [char; 3] = ['!', '-', '-'];

    fn new(lt: Bookmark) -> Self {
        Self { matched: 0, lt }
    }

    fn scan<S: InputSource>(&mut self, cur: &mut Cursor<S>) -> Result<Step, LexError> {
        while self.matched < Self::TAIL.len() {
            let expected = Self::TAIL[self.matched];
            if cur.peek()? != Some(expected) {
                cur.restore(self.lt);
                return Ok(Step::emit(TokenKind::Char));
            }
            cur.append(expected)?;
            self.matched += 1;
        }
        Ok(Step::emit(TokenKind::Cdo))
    }
}

/// A leading `-`: `-->`, a negative number, an identifier or a lone dash.
#[derive(Debug, Default)]
pub(crate) struct CdcScan {
    /// Set once a second `-` was consumed; points just past the first one.
    first_dash: Option<Bookmark>,
}

impl CdcScan {
    fn scan<S: InputSource>(&mut self, cur: &mut Cursor<S>) -> Result<Step, LexError> {
        if let Some(first_dash) = self.first_dash {
            if cur.peek()? == Some('>') {
                cur.append('>')?;
                return Ok(Step::emit(TokenKind::Cdc));
            }
            cur.restore(first_dash);
            return Ok(Step::emit(TokenKind::Char));
        }

        match cur.peek()? {
            Some(ch) if is_digit(ch) || ch == '.' => {
                Ok(Step::Goto(State::Number(NumberScan::new('-', cur.mark()))))
            }
            Some('-') => {
                self.first_dash = Some(cur.mark());
                cur.append('-')?;
                self.scan(cur)
            }
            Some(ch) if is_name_start(ch) => Ok(Step::Goto(State::Ident(IdentScan::default()))),
            Some('\\') => match consume_escape(cur, EscapeMode::Plain)? {
                Escape::Decoded => Ok(Step::Goto(State::Ident(IdentScan::default()))),
                Escape::Invalid => Ok(Step::emit(TokenKind::Char)),
            },
            _ => Ok(Step::emit(TokenKind::Char)),
        }
    }
}

/// `/*` ... `*/`
#[derive(Debug, Default)]
pub(crate) struct CommentScan {
    opened: bool,
    after_star: bool,
}

impl CommentScan {
    fn scan<S: InputSource>(&mut self, cur: &mut Cursor<S>) -> Result<Step, LexError> {
        if !self.opened {
            if cur.peek()? != Some('*') {
                return Ok(Step::emit(TokenKind::Char));
            }
            cur.append('*')?;
            self.opened = true;
        }
        loop {
            let Some(ch) = cur.peek()? else {
                cur.report(LexerDiagnostic::UnterminatedCommentFoundEof);
                return Ok(Step::emit(TokenKind::Eof));
            };
            cur.append(ch)?;
            if self.after_star && ch == '/' {
                return Ok(Step::emit(TokenKind::Comment));
            }
            self.after_star = ch == '*';
        }
    }
}

fn match_operator<S: InputSource>(cur: &mut Cursor<S>, first: char) -> Result<Step, LexError> {
    if cur.peek()? != Some('=') {
        return Ok(Step::emit(TokenKind::Char));
    }
    cur.append('=')?;
    let kind = match first {
        '~' => TokenKind::Includes,
        '|' => TokenKind::DashMatch,
        '^' => TokenKind::PrefixMatch,
        '$' => TokenKind::SuffixMatch,
        _ => TokenKind::SubstringMatch,
    };
    Ok(Step::emit(kind))
}

fn uri<S: InputSource>(cur: &mut Cursor<S>) -> Result<Step, LexError> {
    match cur.peek()? {
        Some(ch @ ('r' | 'R')) => {
            cur.append(ch)?;
            Ok(Step::Goto(State::Url(UrlScan::default())))
        }
        Some('+') => {
            let plus = cur.mark();
            cur.append('+')?;
            Ok(Step::Goto(State::UnicodeRange(UnicodeRangeScan::new(plus))))
        }
        _ => Ok(Step::Goto(State::Ident(IdentScan::default()))),
    }
}

/// nmchar* followed by an optional `(`.
#[derive(Debug, Default)]
pub(crate) struct IdentScan {
    named: bool,
}

impl IdentScan {
    fn scan<S: InputSource>(&mut self, cur: &mut Cursor<S>) -> Result<Step, LexError> {
        if !self.named {
            consume_name(cur)?;
            self.named = true;
        }
        if cur.peek()? == Some('(') {
            cur.append('(')?;
            return Ok(Step::emit(TokenKind::Function));
        }
        Ok(Step::emit(TokenKind::Ident))
    }
}

fn escaped_ident<S: InputSource>(cur: &mut Cursor<S>) -> Result<Step, LexError> {
    match consume_escape(cur, EscapeMode::Plain)? {
        Escape::Decoded => Ok(Step::Goto(State::Ident(IdentScan::default()))),
        Escape::Invalid => {
            cur.append('\\')?;
            Ok(Step::emit(TokenKind::Char))
        }
    }
}

/// `url(` w (string | urlchar*) w `)`, entered after `ur`.
#[derive(Debug, Default)]
pub(crate) struct UrlScan {
    sub: UrlSub,
}

#[derive(Debug, Default)]
enum UrlSub {
    #[default]
    L,
    Paren,
    Body(UrlBody),
}

#[derive(Debug)]
struct UrlBody {
    /// Just past `url(`. Every failure rolls back here.
    checkpoint: Bookmark,
    phase: UrlPhase,
    quoted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UrlPhase {
    LeadingSpace,
    Open,
    Unquoted,
    Quoted(char),
    TrailingSpace,
    Close,
}

impl UrlScan {
    fn scan<S: InputSource>(&mut self, cur: &mut Cursor<S>) -> Result<Step, LexError> {
        loop {
            match &mut self.sub {
                UrlSub::L => match cur.peek()? {
                    Some(ch @ ('l' | 'L')) => {
                        cur.append(ch)?;
                        self.sub = UrlSub::Paren;
                    }
                    _ => return Ok(Step::Goto(State::Ident(IdentScan::default()))),
                },
                UrlSub::Paren => {
                    if cur.peek()? != Some('(') {
                        return Ok(Step::Goto(State::Ident(IdentScan::default())));
                    }
                    cur.append('(')?;
                    self.sub = UrlSub::Body(UrlBody {
                        checkpoint: cur.mark(),
                        phase: UrlPhase::LeadingSpace,
                        quoted: false,
                    });
                }
                UrlSub::Body(body) => return body.scan(cur),
            }
        }
    }
}

impl UrlBody {
    fn scan<S: InputSource>(&mut self, cur: &mut Cursor<S>) -> Result<Step, LexError> {
        loop {
            match self.phase {
                UrlPhase::LeadingSpace => {
                    consume_whitespace(cur)?;
                    self.phase = UrlPhase::Open;
                }
                UrlPhase::Open => match cur.peek()? {
                    None => return Ok(self.fall_back(cur, LexerDiagnostic::UnterminatedUrlFoundEof)),
                    Some(quote @ ('"' | '\'')) => {
                        cur.append(quote)?;
                        self.phase = UrlPhase::Quoted(quote);
                    }
                    Some(_) => self.phase = UrlPhase::Unquoted,
                },
                UrlPhase::Unquoted => {
                    consume_url_chars(cur)?;
                    self.phase = UrlPhase::TrailingSpace;
                }
                UrlPhase::Quoted(quote) => match consume_string_body(cur, quote)? {
                    StringEnd::Closed => {
                        self.quoted = true;
                        self.phase = UrlPhase::TrailingSpace;
                    }
                    StringEnd::Eof => {
                        return Ok(self.fall_back(cur, LexerDiagnostic::UnterminatedUrlFoundEof))
                    }
                    StringEnd::Newline => {
                        return Ok(self.fall_back(cur, LexerDiagnostic::UnexpectedCharInUrl))
                    }
                },
                UrlPhase::TrailingSpace => {
                    consume_whitespace(cur)?;
                    self.phase = UrlPhase::Close;
                }
                UrlPhase::Close => {
                    return match cur.peek()? {
                        Some(')') => {
                            cur.append(')')?;
                            Ok(Step::Emit(Finish {
                                kind: TokenKind::Uri,
                                closed: self.quoted,
                            }))
                        }
                        None => Ok(self.fall_back(cur, LexerDiagnostic::UnterminatedUrlFoundEof)),
                        Some(_) => Ok(self.fall_back(cur, LexerDiagnostic::UnexpectedCharInUrl)),
                    };
                }
            }
        }
    }

    /// Gives up on the url: everything after `url(` is left for the next token.
    fn fall_back<S: InputSource>(&self, cur: &mut Cursor<S>, diagnostic: LexerDiagnostic) -> Step {
        cur.report(diagnostic);
        cur.restore(self.checkpoint);
        Step::emit(TokenKind::Function)
    }
}

/// `u+` [0-9a-fA-F?]{1,6} (`-` [0-9a-fA-F]{1,6})?
#[derive(Debug)]
pub(crate) struct UnicodeRangeScan {
    sub: RangeSub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RangeSub {
    /// `plus` is in front of the `+`.
    Start { plus: Bookmark, count: u8 },
    Dash,
    /// `dash` is in front of the `-`.
    End { dash: Bookmark, count: u8 },
}

impl UnicodeRangeScan {
    const MAX_DIGITS: u8 = 6;

    fn new(plus: Bookmark) -> Self {
        Self { sub: RangeSub::Start { plus, count: 0 } }
    }

    fn scan<S: InputSource>(&mut self, cur: &mut Cursor<S>) -> Result<Step, LexError> {
        loop {
            match self.sub {
                RangeSub::Start { plus, count } => {
                    let next = match count {
                        Self::MAX_DIGITS => None,
                        _ => cur.peek()?.filter(|&ch| is_hex(ch) || ch == '?'),
                    };
                    match next {
                        Some(ch) => {
                            cur.append(ch)?;
                            self.sub = RangeSub::Start { plus, count: count + 1 };
                        }
                        None if count == 0 => {
                            // `u` alone is an identifier
                            cur.restore(plus);
                            return Ok(Step::Goto(State::Ident(IdentScan::default())));
                        }
                        None => self.sub = RangeSub::Dash,
                    }
                }
                RangeSub::Dash => {
                    if cur.peek()? != Some('-') {
                        return Ok(Step::emit(TokenKind::UnicodeRange));
                    }
                    let dash = cur.mark();
                    cur.append('-')?;
                    self.sub = RangeSub::End { dash, count: 0 };
                }
                RangeSub::End { dash, count } => {
                    let next = match count {
                        Self::MAX_DIGITS => None,
                        _ => cur.peek()?.filter(|&ch| is_hex(ch)),
                    };
                    match next {
                        Some(ch) => {
                            cur.append(ch)?;
                            self.sub = RangeSub::End { dash, count: count + 1 };
                        }
                        None => {
                            if count == 0 {
                                cur.restore(dash);
                            }
                            return Ok(Step::emit(TokenKind::UnicodeRange));
                        }
                    }
                }
            }
        }
    }
}
