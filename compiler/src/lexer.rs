// Lexer for tile composition expressions.
//
// Two stages: a `logos` DFA splits the input into the fixed vocabulary
// (operators, parentheses, brackets, integers) and "words"; words are then
// resolved against the tile catalog by longest-prefix match, so a word may
// hold several back-to-back tile names.
//
// Preconditions: input is valid UTF-8.
// Postconditions: returns tokens with byte-offset spans plus the spans of
//                 all input that was skipped.
// Failure modes: none. Unrecognised input is skipped one character at a
//                time and lexing continues.
// Side effects: `debug!` log line per skipped run.

use logos::Logos;
use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::catalog::Catalog;
use crate::connect::Operator;
use crate::tile::TileClass;

/// Byte-offset span in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at `at`.
    pub fn point(at: usize) -> Self {
        Self { start: at, end: at }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A composition token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Operator(Operator),
    LParen,
    RParen,
    /// Reference to a catalog tile, with its optional `[n]` parameter
    /// (0 when absent).
    TileRef {
        name: String,
        class: TileClass,
        param: u64,
    },
    // ── Stray punctuation ──
    //
    // Only produced when a bracket or integer is not part of a `ref[n]`
    // parameter. They have no semantic action in the composition grammar.
    LBracket,
    RBracket,
    Integer(u64),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Operator(op) => write!(f, "{}", op.symbol()),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::TileRef { name, param, .. } if *param == 0 => write!(f, "{}", name),
            Token::TileRef { name, param, .. } => write!(f, "{}[{}]", name, param),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Integer(n) => write!(f, "{}", n),
        }
    }
}

/// Result of lexing: tokens plus the input that was skipped.
#[derive(Debug, Default)]
pub struct LexResult {
    pub tokens: Vec<(Token, Span)>,
    pub skipped: Vec<Span>,
}

// ── Fixed vocabulary ──

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum RawToken {
    // `++` and `+1` are longer than `+`; the DFA always takes the longest.
    #[token("++")]
    PlusPlus,
    #[token("+1")]
    PlusOne,
    #[token("+")]
    Plus,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    #[regex(r"[0-9]+", parse_integer)]
    Integer(u64),

    /// Candidate tile-name run. Must agree with `catalog::is_name_char`.
    #[regex(r"[A-Za-z0-9_.\-]*[A-Za-z_.\-][A-Za-z0-9_.\-]*")]
    Word,
}

fn parse_integer(lex: &mut logos::Lexer<'_, RawToken>) -> Option<u64> {
    lex.slice().parse().ok()
}

// ── Public API ──

/// Lex a composition expression against `catalog`.
///
/// A tile reference followed by `[` integer `]` takes the integer as its
/// parameter. Lexing never fails.
pub fn tokenize(source: &str, catalog: &Catalog) -> LexResult {
    let mut flat: Vec<(Token, Span)> = Vec::new();
    let mut skipped = Vec::new();

    for (result, range) in RawToken::lexer(source).spanned() {
        let span = Span::new(range.start, range.end);
        let token = match result {
            Ok(RawToken::PlusPlus) => Token::Operator(Operator::TreeFanOut),
            Ok(RawToken::PlusOne) => Token::Operator(Operator::SingleEdge),
            Ok(RawToken::Plus) => Token::Operator(Operator::SizeMatched),
            Ok(RawToken::LParen) => Token::LParen,
            Ok(RawToken::RParen) => Token::RParen,
            Ok(RawToken::LBracket) => Token::LBracket,
            Ok(RawToken::RBracket) => Token::RBracket,
            Ok(RawToken::Integer(n)) => Token::Integer(n),
            Ok(RawToken::Word) => {
                resolve_word(&source[range.clone()], range.start, catalog, &mut flat, &mut skipped);
                continue;
            }
            Err(()) => {
                debug!(span = %span, text = &source[range], "skipping unrecognised input");
                skipped.push(span);
                continue;
            }
        };
        flat.push((token, span));
    }

    LexResult {
        tokens: attach_params(flat),
        skipped,
    }
}

/// Split a word into catalog tile references, longest name first.
fn resolve_word(
    word: &str,
    offset: usize,
    catalog: &Catalog,
    out: &mut Vec<(Token, Span)>,
    skipped: &mut Vec<Span>,
) {
    let mut pos = 0;
    let mut skip_start: Option<usize> = None;
    while pos < word.len() {
        match catalog.longest_prefix(&word[pos..]) {
            Some((name, class)) => {
                if let Some(start) = skip_start.take() {
                    record_skip(word, offset, start, pos, skipped);
                }
                out.push((
                    Token::TileRef {
                        name: name.to_string(),
                        class,
                        param: 0,
                    },
                    Span::new(offset + pos, offset + pos + name.len()),
                ));
                pos += name.len();
            }
            None => {
                skip_start.get_or_insert(pos);
                // Words are ASCII by construction of the regex.
                pos += 1;
            }
        }
    }
    if let Some(start) = skip_start {
        record_skip(word, offset, start, pos, skipped);
    }
}

fn record_skip(word: &str, offset: usize, start: usize, end: usize, skipped: &mut Vec<Span>) {
    let span = Span::new(offset + start, offset + end);
    debug!(span = %span, text = &word[start..end], "skipping text with no catalog match");
    skipped.push(span);
}

/// Fold `TileRef [ Integer ]` into a parameterised `TileRef`.
fn attach_params(flat: Vec<(Token, Span)>) -> Vec<(Token, Span)> {
    let mut tokens = Vec::with_capacity(flat.len());
    let mut iter = flat.into_iter();
    while let Some((token, span)) = iter.next() {
        let (name, class) = match token {
            Token::TileRef { name, class, .. } => (name, class),
            other => {
                tokens.push((other, span));
                continue;
            }
        };
        // Peek without cloning the remaining tokens.
        let param = match iter.as_slice() {
            [(Token::LBracket, _), (Token::Integer(n), _), (Token::RBracket, _), ..] => Some(*n),
            _ => None,
        };
        let (param, end) = match param {
            Some(n) => (n, iter.nth(2).map_or(span.end, |(_, s)| s.end)),
            None => (0, span.end),
        };
        tokens.push((Token::TileRef { name, class, param }, Span::new(span.start, end)));
    }
    tokens
}

// ── Tests ──
