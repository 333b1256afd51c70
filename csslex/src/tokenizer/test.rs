#![cfg(test)]

mod test_css_lexer {
    use strum::IntoEnumIterator;

    use super::super::{
        tokenize, tokenize_with, InputSource, LexError, Lexer, LexerDiagnostic, OwnedToken, Peek,
        SourceError, StrInput, StreamInput, TokenKind, TokenKind::*,
    };
    use crate::config::LexerConfig;

    fn ast(input: &str, expected: Vec<(TokenKind, &str)>) {
        let tokens: Vec<(TokenKind, std::string::String)> = tokenize(input)
            .map(|t| t.map(|t| (t.kind, t.text)))
            .collect::<Result<_, _>>()
            .unwrap();
        println!(
            "tokens: {}",
            tokens
                .iter()
                .map(|(kind, text)| format!("{kind:?}({text:?})"))
                .collect::<Vec<_>>()
                .join(" > ")
        );
        let expected: Vec<(TokenKind, std::string::String)> = expected
            .into_iter()
            .map(|(kind, text)| (kind, text.to_owned()))
            .collect();
        assert_eq!(tokens, expected, "on input `{input}`");
    }

    fn kinds(input: &str, expected: Vec<TokenKind>) {
        let received: Vec<TokenKind> = tokenize(input).map(|t| t.unwrap().kind).collect();
        assert_eq!(received, expected, "on input `{input}`");
    }

    /// Every token up to and including the first `Eof`.
    fn lex_until_eof<S: InputSource>(lexer: &mut Lexer<S>) -> Vec<OwnedToken> {
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token().unwrap().to_owned_token();
            let eof = token.kind == Eof;
            tokens.push(token);
            if eof {
                return tokens;
            }
        }
    }

    /// Lexes `chunks` through a stream, pushing the next chunk on every `NeedData`.
    fn lex_streamed<'a>(chunks: impl IntoIterator<Item = &'a str>) -> Vec<OwnedToken> {
        let mut chunks = chunks.into_iter();
        let mut lexer = Lexer::new(StreamInput::new());
        let mut tokens = Vec::new();
        loop {
            match lexer.next_token() {
                Ok(token) => {
                    let token = token.to_owned_token();
                    let eof = token.kind == Eof;
                    tokens.push(token);
                    if eof {
                        return tokens;
                    }
                }
                Err(LexError::NeedData) => match chunks.next() {
                    Some(chunk) => lexer.source_mut().push(chunk),
                    None => lexer.source_mut().finish(),
                },
                Err(err) => panic!("unexpected lexer error {err}"),
            }
        }
    }

    fn char_chunks(input: &str) -> Vec<&str> {
        input
            .char_indices()
            .map(|(i, ch)| &input[i..i + ch.len_utf8()])
            .collect()
    }

    fn assert_reconstructs(input: &str) {
        let mut lexer = Lexer::new(StrInput::new(input));
        let tokens = lex_until_eof(&mut lexer);
        let mut offset = 0;
        for token in &tokens {
            assert_eq!(token.offset, offset, "gap before {token:?} on input `{input}`");
            if token.kind != Eof {
                assert!(token.len > 0, "empty {token:?} on input `{input}`");
            }
            offset += token.len;
        }
        assert_eq!(offset, input.len(), "on input `{input}`");
    }

    const SAMPLES: &[&str] = &[
        "@media screen and (min-width: 10.5em) { a:hover { color: #f0f !important } }",
        "/* comment */ @import url( \"x.css\" ) print;",
        "a[href^='http'], a[title~=\"x\"], a[lang|=en] { content: \"\\201C\" }",
        "<!-- .x { background: URL(img/a\\ b.png) no-repeat } -->",
        "@font-face { unicode-range: U+0025-00FF, u+4??; src: url(a.woff) }",
        "p { margin: -1.5px +2px .5em 0; width: calc(100% - 3px) }",
        "\\41 bc \\\n 'open\nstring' \"unterminated",
        "url(  a b ) url('x' y) url(\"z\" ) url(\\41)",
        "x { y: 1e3 5-x 1-2 --custom \u{060F}rf }\r\n\x0C\t/* trailing",
    ];

    #[test]
    fn whitespace() {
        ast(" ", vec![(Whitespace, " ")]);
        ast("\t\r\n\x0C ", vec![(Whitespace, "\t\r\n\x0C ")]);
        ast(" @", vec![(Whitespace, " "), (Char, "@")]);
        kinds(" /* comment*/ \n/*comment*/@", vec![Whitespace, Whitespace, Char]);
        kinds("/*comment*/ @", vec![Whitespace, Char]);
    }

    #[test]
    fn comments_when_configured() {
        let config = LexerConfig { emit_comments: true };
        let tokens: Vec<_> = tokenize_with(" /* a */x/**/", config)
            .map(|t| t.map(|t| (t.kind, t.text)))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            tokens,
            vec![
                (Whitespace, " ".to_owned()),
                (Comment, " a ".to_owned()),
                (Ident, "x".to_owned()),
                (Comment, "".to_owned()),
            ]
        );

        let mut lexer = Lexer::new(StrInput::new("/*x*/a"));
        assert_eq!(lexer.next_token().unwrap().kind, Ident);
        let mut lexer = Lexer::new(StrInput::new("/*x*/a"));
        lexer.set_emit_comments(true);
        assert!(lexer.config().emit_comments);
        assert_eq!(lexer.next_token().unwrap().data, b"x");
    }

    #[test]
    fn unterminated_comment_is_end_of_input() {
        let mut lexer = Lexer::new(StrInput::new("a /* open"));
        let tokens = lex_until_eof(&mut lexer);
        let last = tokens.last().unwrap();
        assert_eq!(last.kind, Eof);
        assert_eq!(last.text, "");
        assert_eq!((last.offset, last.len), (2, 7));
        assert_eq!(
            lexer.take_diagnostics().iter().map(|d| d.diagnostic).collect::<Vec<_>>(),
            vec![LexerDiagnostic::UnterminatedCommentFoundEof]
        );
        let again = lexer.next_token().unwrap();
        assert_eq!((again.kind, again.offset, again.raw_len), (Eof, 9, 0));
    }

    #[test]
    fn token_ident() {
        ast("screen", vec![(Ident, "screen")]);
        ast("\u{060F}rf", vec![(Ident, "\u{060F}rf")]);
        ast("über", vec![(Ident, "über")]);
        ast("-bo", vec![(Ident, "-bo")]);
        ast("_bo", vec![(Ident, "_bo")]);
        ast("red--", vec![(Ident, "red--")]);
        ast("red-->", vec![(Ident, "red--"), (Char, ">")]);
        ast("--x", vec![(Char, "-"), (Ident, "-x")]);
        ast("a\\.b", vec![(Ident, "a.b")]);
        ast("\\E9motion", vec![(Ident, "émotion")]);
        ast("\\E9 dition", vec![(Ident, "édition")]);
        ast("\\0000E9dition", vec![(Ident, "édition")]);
        ast("S\\0000e9f", vec![(Ident, "Séf")]);
        ast("u", vec![(Ident, "u")]);
        ast("ur", vec![(Ident, "ur")]);
        ast("url", vec![(Ident, "url")]);
        ast("urlx", vec![(Ident, "urlx")]);
    }

    #[test]
    fn escapes_decode_into_the_escape_buffer() {
        let mut lexer = Lexer::new(StrInput::new("\\41 bc d"));
        let token = lexer.next_token().unwrap();
        assert_eq!((token.kind, token.data), (Ident, &b"Abc"[..]));
        assert!(token.escaped);
        assert_eq!(token.raw_len, 6);

        let token = lexer.next_token().unwrap();
        assert_eq!(token.kind, Whitespace);
        assert!(!token.escaped);

        ast("\\0", vec![(Ident, "\u{FFFD}")]);
        ast("\\D x", vec![(Ident, "\nx")]);
        ast("\\110000", vec![(Ident, "\u{FFFD}")]);
    }

    #[test]
    fn invalid_escapes() {
        ast("\\\nx", vec![(Char, "\\"), (Whitespace, "\n"), (Ident, "x")]);
        ast("\\", vec![(Char, "\\")]);
        ast("a\\\n", vec![(Ident, "a"), (Char, "\\"), (Whitespace, "\n")]);
        ast("-\\\n", vec![(Char, "-"), (Char, "\\"), (Whitespace, "\n")]);
    }

    #[test]
    fn token_function() {
        ast("rgb(", vec![(Function, "rgb")]);
        ast("calc(1)", vec![(Function, "calc"), (Number, "1"), (Char, ")")]);
        ast("-moz-calc(", vec![(Function, "-moz-calc")]);
        ast("\\75rl(x)", vec![(Function, "url"), (Ident, "x"), (Char, ")")]);
    }

    #[test]
    fn token_at_keyword() {
        ast("@import", vec![(AtKeyword, "import")]);
        ast("@importttt", vec![(AtKeyword, "importttt")]);
        ast("@-moz-document", vec![(AtKeyword, "-moz-document")]);
        ast("@\\41", vec![(AtKeyword, "A")]);
        ast("@5", vec![(Char, "@"), (Number, "5")]);
        ast("@-5", vec![(Char, "@"), (Number, "-5")]);
        ast("@ x", vec![(Char, "@"), (Whitespace, " "), (Ident, "x")]);
        ast("@", vec![(Char, "@")]);
    }

    #[test]
    fn token_string() {
        ast("'abc'", vec![(String, "abc")]);
        ast("\"a'b\"", vec![(String, "a'b")]);
        ast("''", vec![(String, "")]);
        ast("'a\\'b'", vec![(String, "a'b")]);
        ast("'a\\\nb'", vec![(String, "ab")]);
        ast("'a\\\r\nb'", vec![(String, "ab")]);
        ast("'\\41 '", vec![(String, "A")]);
        ast("'abc", vec![(String, "abc")]);
        ast("'abc\\", vec![(String, "abc")]);
        ast("\"", vec![(String, "")]);
    }

    #[test]
    fn token_invalid_string() {
        ast(
            "'ab\ncd'",
            vec![
                (InvalidString, "ab"),
                (Whitespace, "\n"),
                (Ident, "cd"),
                (String, ""),
            ],
        );
        ast("\"\r\n", vec![(InvalidString, ""), (Whitespace, "\r\n")]);
    }

    #[test]
    fn token_hash() {
        ast("#a1b2", vec![(Hash, "a1b2")]);
        ast("#-x", vec![(Hash, "-x")]);
        ast("#1", vec![(Hash, "1")]);
        ast("#\\41", vec![(Hash, "A")]);
        ast("#", vec![(Char, "#")]);
        ast("# a", vec![(Char, "#"), (Whitespace, " "), (Ident, "a")]);
        ast("#\\\n", vec![(Char, "#"), (Char, "\\"), (Whitespace, "\n")]);
    }

    #[test]
    fn token_number() {
        ast("0", vec![(Number, "0")]);
        ast("10.55", vec![(Number, "10.55")]);
        ast(".5", vec![(Number, ".5")]);
        ast("+5", vec![(Number, "+5")]);
        ast("-.5", vec![(Number, "-.5")]);
        ast("1.", vec![(Number, "1"), (Char, ".")]);
        ast("1..2", vec![(Number, "1"), (Char, "."), (Number, ".2")]);
        ast("1-2", vec![(Number, "1"), (Number, "-2")]);
        ast(".", vec![(Char, ".")]);
        ast("+", vec![(Char, "+")]);
        ast("+.", vec![(Char, "+"), (Char, ".")]);
        ast("-", vec![(Char, "-")]);
    }

    #[test]
    fn token_percentage_and_dimension() {
        ast("50%", vec![(Percentage, "50")]);
        ast("-0.5%", vec![(Percentage, "-0.5")]);
        ast("10px", vec![(Dimension, "10px")]);
        ast("1e3", vec![(Dimension, "1e3")]);
        ast("5-x", vec![(Dimension, "5-x")]);
        ast("2\\70 x", vec![(Dimension, "2px")]);
        ast("3-", vec![(Number, "3"), (Char, "-")]);
        ast("4\\\n", vec![(Number, "4"), (Char, "\\"), (Whitespace, "\n")]);
    }

    #[test]
    fn token_cdo_cdc() {
        ast("<!--", vec![(Cdo, "<!--")]);
        ast("<!-x", vec![(Char, "<"), (Char, "!"), (Ident, "-x")]);
        ast("<!", vec![(Char, "<"), (Char, "!")]);
        ast("<", vec![(Char, "<")]);
        ast("-->", vec![(Cdc, "-->")]);
        ast("--", vec![(Char, "-"), (Char, "-")]);
    }

    #[test]
    fn token_matches() {
        ast("~=", vec![(Includes, "~=")]);
        ast("|=", vec![(DashMatch, "|=")]);
        ast("^=", vec![(PrefixMatch, "^=")]);
        ast("$=", vec![(SuffixMatch, "$=")]);
        ast("*=", vec![(SubstringMatch, "*=")]);
        ast("*", vec![(Char, "*")]);
        ast("~ =", vec![(Char, "~"), (Whitespace, " "), (Char, "=")]);
    }

    #[test]
    fn token_url() {
        ast("url(a.png)", vec![(Uri, "a.png")]);
        ast("URL( a.png )", vec![(Uri, "a.png")]);
        ast("url()", vec![(Uri, "")]);
        ast("url('a b')", vec![(Uri, "a b")]);
        ast("url( \"x\\41\" )", vec![(Uri, "xA")]);
        ast("url(a\\)b)", vec![(Uri, "a)b")]);
        ast("url(http://x.y/z?q=1#f)", vec![(Uri, "http://x.y/z?q=1#f")]);
    }

    #[test]
    fn token_url_falls_back_to_function() {
        ast("url(", vec![(Function, "url")]);
        ast("url(  ", vec![(Function, "url"), (Whitespace, "  ")]);
        ast("url(a", vec![(Function, "url"), (Ident, "a")]);
        ast(
            "url(a b)",
            vec![
                (Function, "url"),
                (Ident, "a"),
                (Whitespace, " "),
                (Ident, "b"),
                (Char, ")"),
            ],
        );
        ast("url('a'b)", vec![(Function, "url"), (String, "a"), (Ident, "b"), (Char, ")")]);
        ast("url('a", vec![(Function, "url"), (String, "a")]);
        ast(
            "url('a\n')",
            vec![
                (Function, "url"),
                (InvalidString, "a"),
                (Whitespace, "\n"),
                (String, ")"),
            ],
        );
    }

    #[test]
    fn token_unicode_range() {
        ast("U+0-7F", vec![(UnicodeRange, "0-7F")]);
        ast("u+4??", vec![(UnicodeRange, "4??")]);
        ast("u+0025-00FF", vec![(UnicodeRange, "0025-00FF")]);
        ast("u+1234567", vec![(UnicodeRange, "123456"), (Number, "7")]);
        ast("u+1-", vec![(UnicodeRange, "1"), (Char, "-")]);
        ast("u+", vec![(Ident, "u"), (Char, "+")]);
        ast("u+x", vec![(Ident, "u"), (Char, "+"), (Ident, "x")]);
    }

    #[test]
    fn token_char() {
        for ch in ["{", "}", ";", ":", ",", "(", ")", "[", "]", "!", ">", "=", "%", "&", "?"] {
            ast(ch, vec![(Char, ch)]);
        }
        ast("/", vec![(Char, "/")]);
        ast("/ *", vec![(Char, "/"), (Whitespace, " "), (Char, "*")]);
    }

    #[test]
    fn rule_set() {
        kinds(
            "a.b > c { color: #fff; }",
            vec![
                Ident, Char, Ident, Whitespace, Char, Whitespace, Ident, Whitespace, Char,
                Whitespace, Ident, Char, Whitespace, Hash, Char, Whitespace, Char,
            ],
        );
    }

    #[test]
    fn positions() {
        let mut lexer = Lexer::new(StrInput::new("a\n  b\r\nc\rdé f"));
        let tokens = lex_until_eof(&mut lexer);
        let posed: Vec<_> = tokens.iter().map(|t| (t.kind, t.line, t.column)).collect();
        assert_eq!(
            posed,
            vec![
                (Ident, 1, 1),
                (Whitespace, 1, 2),
                (Ident, 2, 3),
                (Whitespace, 2, 4),
                (Ident, 3, 1),
                (Whitespace, 3, 2),
                (Ident, 4, 1),
                (Whitespace, 4, 3),
                (Ident, 4, 4),
                (Eof, 4, 5),
            ]
        );
        assert_eq!((lexer.position().line, lexer.position().column), (4, 5));
    }

    #[test]
    fn unescaped_payload_borrows_the_input() {
        let input = "  #abc";
        let mut lexer = Lexer::new(StrInput::new(input));
        lexer.next_token().unwrap();
        let token = lexer.next_token().unwrap();
        assert_eq!(token.kind, Hash);
        assert!(!token.escaped);
        let start = token.data.as_ptr() as usize - input.as_ptr() as usize;
        assert_eq!(start, 3);
        assert_eq!(token.offset, 2);
    }

    #[test]
    fn eof_repeats() {
        let mut lexer = Lexer::new(StrInput::new("a"));
        assert_eq!(lexer.next_token().unwrap().kind, Ident);
        for _ in 0..3 {
            let token = lexer.next_token().unwrap();
            assert_eq!((token.kind, token.data, token.offset), (Eof, &b""[..], 1));
        }
        let mut lexer = Lexer::new(StrInput::new(""));
        assert_eq!(lexer.next_token().unwrap().kind, Eof);
        assert_eq!(lexer.next_token().unwrap().kind, Eof);
    }

    #[test]
    fn diagnostics() {
        let mut tokens = tokenize("'ab\n\"cd");
        assert_eq!(tokens.by_ref().count(), 3);
        let diagnostics: Vec<_> = tokens
            .take_diagnostics()
            .into_iter()
            .map(|d| (d.diagnostic, d.line, d.column))
            .collect();
        assert_eq!(
            diagnostics,
            vec![
                (LexerDiagnostic::NewlineInString, 1, 4),
                (LexerDiagnostic::UnterminatedStringFoundEof, 2, 4),
            ]
        );

        let mut lexer = Lexer::new(StrInput::new("url(a b) url("));
        lex_until_eof(&mut lexer);
        let diagnostics: Vec<_> =
            lexer.take_diagnostics().into_iter().map(|d| d.diagnostic).collect();
        assert_eq!(
            diagnostics,
            vec![LexerDiagnostic::UnexpectedCharInUrl, LexerDiagnostic::UnterminatedUrlFoundEof]
        );
        assert!(lexer.take_diagnostics().is_empty());
    }

    #[test]
    fn skipped_comments_belong_to_the_next_token() {
        let mut lexer = Lexer::new(StrInput::new("/**/a"));
        let token = lexer.next_token().unwrap();
        assert_eq!((token.kind, token.data), (Ident, &b"a"[..]));
        assert_eq!((token.offset, token.raw_len), (0, 5));
        assert_eq!((token.line, token.column), (1, 5));
        let token = lexer.next_token().unwrap();
        assert_eq!((token.kind, token.offset, token.raw_len), (Eof, 5, 0));

        let mut lexer = Lexer::new(StrInput::new("a/* x */\n/**/"));
        let tokens = lex_until_eof(&mut lexer);
        let spans: Vec<_> = tokens.iter().map(|t| (t.kind, t.offset, t.len)).collect();
        assert_eq!(spans, vec![(Ident, 0, 1), (Whitespace, 1, 8), (Eof, 9, 4)]);

        assert_reconstructs("/**/a");
        assert_reconstructs("/* a *//* b */ /**/");
    }

    #[test]
    fn reconstructs_input_from_raw_spans() {
        for input in SAMPLES {
            assert_reconstructs(input);
        }
        assert_reconstructs("");
        assert_reconstructs("/*");
    }

    #[test]
    fn streaming_char_by_char_matches_complete_input() {
        for input in SAMPLES {
            let expected = lex_until_eof(&mut Lexer::new(StrInput::new(input)));
            let streamed = lex_streamed(char_chunks(input));
            assert_eq!(streamed, expected, "on input `{input}`");
        }
    }

    #[test]
    fn need_data_keeps_partial_token() {
        let mut lexer = Lexer::new(StreamInput::new());
        lexer.source_mut().push("url(  'a\\");
        assert_eq!(lexer.next_token().map(|t| t.kind), Err(LexError::NeedData));
        assert_eq!(lexer.next_token().map(|t| t.kind), Err(LexError::NeedData));
        lexer.source_mut().push("62' )x");
        let token = lexer.next_token().unwrap();
        assert_eq!((token.kind, token.data, token.escaped), (Uri, &b"ab"[..], true));
        assert_eq!(token.raw_len, 14);
        assert_eq!(lexer.next_token().map(|t| t.kind), Err(LexError::NeedData));
        lexer.source_mut().finish();
        assert_eq!(lexer.next_token().unwrap().kind, Ident);
        assert_eq!(lexer.next_token().unwrap().kind, Eof);
        assert!(lexer.source().is_finished());
    }

    fn random_css(rng: &mut fastrand::Rng, len: usize) -> std::string::String {
        const ALPHABET: &[char] = &[
            'a', 'u', 'r', 'l', 'U', 'x', '-', '_', '0', '7', 'e', 'f', '.', '+', '%', '#', '@',
            '<', '!', '>', '/', '*', '~', '|', '^', '$', '=', '(', ')', '\'', '"', '\\', '?',
            ' ', '\t', '\n', '\r', '\x0C', 'é', '😎', ';', '{', '}',
        ];
        (0..len).map(|_| ALPHABET[rng.usize(..ALPHABET.len())]).collect()
    }

    #[test]
    fn randomized_inputs() {
        for seed in 0..64 {
            let mut rng = fastrand::Rng::with_seed(seed);
            let len = rng.usize(0..96);
            let mut input = random_css(&mut rng, len);
            if seed % 2 == 0 {
                // a complete comment followed by more tokens
                let head_len = rng.usize(0..16);
                let head = random_css(&mut rng, head_len);
                input = format!("{head}/* {seed} */x{input}");
            }

            assert_reconstructs(&input);

            let expected = lex_until_eof(&mut Lexer::new(StrInput::new(&input)));
            let mut chunks = Vec::new();
            let mut rest = input.as_str();
            while !rest.is_empty() {
                let mut end = rng.usize(1..=rest.len().min(8));
                while !rest.is_char_boundary(end) {
                    end += 1;
                }
                chunks.push(&rest[..end]);
                rest = &rest[end..];
            }
            assert_eq!(lex_streamed(chunks), expected, "seed {seed}, input {input:?}");
        }
    }

    struct FaultySource {
        input: &'static str,
    }

    impl InputSource for FaultySource {
        fn peek(&mut self, offset: usize) -> Result<Peek, SourceError> {
            match self.input[offset..].chars().next() {
                Some(ch) => Ok(Peek::Char(ch)),
                None => Err(SourceError::Fault("disk on fire".to_owned())),
            }
        }

        fn window(&self, len: usize) -> &[u8] {
            &self.input.as_bytes()[..len]
        }

        fn advance(&mut self, n: usize) {
            self.input = &self.input[n..];
        }
    }

    #[test]
    fn source_fault_is_surfaced() {
        let mut lexer = Lexer::new(FaultySource { input: "ab" });
        let err = lexer.next_token().unwrap_err();
        assert_eq!(err, LexError::Fault("disk on fire".to_owned()));
        assert!(!err.is_resumable());
        assert_eq!(err.to_string(), "input source fault: disk on fire");
    }

    #[test]
    fn token_kinds_have_names() {
        let names: Vec<&'static str> = TokenKind::iter().map(Into::into).collect();
        assert_eq!(names.len(), 22);
        assert_eq!(names.first(), Some(&"AtKeyword"));
        assert_eq!(names.last(), Some(&"Eof"));
        assert_eq!(UnicodeRange.to_string(), "UnicodeRange");
    }

    #[test]
    fn owned_tokens_serialize() {
        let token = tokenize("#x").next().unwrap().unwrap();
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "kind": "Hash",
                "text": "x",
                "line": 1,
                "column": 1,
                "offset": 0,
                "len": 2,
                "escaped": false,
            })
        );
    }
}
