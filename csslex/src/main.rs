use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use tracing::{info, warn};

use csslex::config::LexerConfig;
use csslex::logging::tracing_init;
use csslex::tokenizer::{LexError, Lexer, OwnedToken, StreamInput, TokenKind};

const USAGE: &str = "usage: csslex [--comments] [--json] [--trace] [-v...] [--config FILE] [FILE]";

const CHUNK_SIZE: usize = 8 * 1024;

#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    comments: bool,
    json: bool,
    trace: bool,
    verbose: u8,
    input: Option<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Option<Args>> {
    let mut parsed = Args::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--comments" => parsed.comments = true,
            "--json" => parsed.json = true,
            "--trace" => parsed.trace = true,
            "--config" => {
                let path = args.next().context("--config needs a file")?;
                parsed.config = Some(PathBuf::from(path));
            }
            flag if flag.len() > 1 && flag.starts_with('-') && flag[1..].chars().all(|c| c == 'v') => {
                parsed.verbose = parsed.verbose.saturating_add((flag.len() - 1) as u8);
            }
            flag if flag.starts_with('-') && flag != "-" => bail!("unknown flag {flag}\n{USAGE}"),
            path => {
                if parsed.input.is_some() {
                    bail!("more than one input file given\n{USAGE}");
                }
                if path != "-" {
                    parsed.input = Some(PathBuf::from(path));
                }
            }
        }
    }
    Ok(Some(parsed))
}

/// Turns a byte stream into text, carrying incomplete sequences over to the
/// next chunk. Invalid sequences become U+FFFD.
#[derive(Debug, Default)]
struct Utf8Chunks {
    pending: Vec<u8>,
}

impl Utf8Chunks {
    fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut text = String::new();
        let mut rest = self.pending.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    text.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }
        let consumed = self.pending.len() - rest.len();
        self.pending.drain(..consumed);
        text
    }

    /// Whatever is left at the end of input, lossily.
    fn finish(&mut self) -> String {
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        tail
    }
}

fn write_token(out: &mut impl Write, token: &OwnedToken, json: bool) -> anyhow::Result<()> {
    if json {
        serde_json::to_writer(&mut *out, token)?;
        writeln!(out)?;
    } else {
        writeln!(out, "{}:{}\t{}\t{:?}", token.line, token.column, token.kind, token.text)?;
    }
    Ok(())
}

#[tracing::instrument(skip_all)]
fn run(args: Args) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => LexerConfig::from_path(path)?,
        None => LexerConfig::default(),
    };
    if args.comments {
        config.emit_comments = true;
    }

    let mut reader: Box<dyn Read> = match &args.input {
        Some(path) => Box::new(
            std::fs::File::open(path)
                .with_context(|| format!("could not open {}", path.display()))?,
        ),
        None => Box::new(io::stdin().lock()),
    };
    info!(input = ?args.input, ?config, "tokenizing");

    let mut out = BufWriter::new(io::stdout().lock());
    let mut lexer = Lexer::with_config(StreamInput::new(), config);
    let mut chunks = Utf8Chunks::default();
    let mut buf = vec![0; CHUNK_SIZE];
    let mut count = 0usize;

    loop {
        match lexer.next_token().map(|token| token.to_owned_token()) {
            Ok(token) if token.kind == TokenKind::Eof => break,
            Ok(token) => {
                write_token(&mut out, &token, args.json)?;
                count += 1;
            }
            Err(LexError::NeedData) => {
                let n = match reader.read(&mut buf) {
                    Ok(n) => n,
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                    Err(err) => return Err(err).context("could not read input"),
                };
                if n == 0 {
                    let tail = chunks.finish();
                    let source = lexer.source_mut();
                    source.push(&tail);
                    source.finish();
                } else {
                    lexer.source_mut().push(&chunks.decode(&buf[..n]));
                }
            }
            Err(err) => return Err(err).context("tokenizing failed"),
        }
    }
    out.flush()?;

    for posed in lexer.take_diagnostics() {
        warn!(line = posed.line, column = posed.column, "{}", posed.diagnostic);
    }
    info!(count, "done");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let Some(args) = parse_args(std::env::args().skip(1))? else {
        println!("{USAGE}");
        return Ok(());
    };
    let _chrome_trace_guard = tracing_init(args.verbose, args.trace)?;
    run(args)
}
