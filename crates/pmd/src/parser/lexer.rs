//! Template lexer using winnow.
//!
//! Splits a template body into text runs and the tokens found inside
//! `{{ ... }}` and `{% ... %}` regions. Handles:
//! - Identifiers, string literals (with `\"`, `\'`, `\\`, `\n`, `\t` escapes)
//! - Numbers, including numeric path segments after a `.`
//! - Comparison operators and parentheses
//! - `{# ... #}` comments, which produce no tokens
//!
//! There is no escape for a literal `{{`, `{%` or `{#` in text.

use std::{fmt, iter};

use winnow::combinator::{alt, opt, preceded, repeat};
use winnow::prelude::*;
use winnow::token::{none_of, one_of, take_while};

use super::ast::Position;
use super::error::LexError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Text,
    VarOpen,
    VarClose,
    TagOpen,
    TagClose,
    Ident,
    StringLiteral,
    NumberLiteral,
    Operator,
    Dot,
    Comma,
    Eof,
}

/// A lexed token. String literals carry their unescaped value in `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: Position,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
        }
    }

    /// Whether this is the identifier `word`.
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == word
    }

    /// Whether this is the operator `symbol`.
    pub fn is_operator(&self, symbol: &str) -> bool {
        self.kind == TokenKind::Operator && self.text == symbol
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => f.write_str("end of input"),
            TokenKind::Text => f.write_str("text"),
            TokenKind::StringLiteral => write!(f, "string \"{}\"", self.text),
            _ => write!(f, "'{}'", self.text),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Region {
    Variable,
    Tag,
    Comment,
}

impl Region {
    fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            b'{' => Some(Region::Variable),
            b'%' => Some(Region::Tag),
            b'#' => Some(Region::Comment),
            _ => None,
        }
    }

    fn open(self) -> &'static str {
        match self {
            Region::Variable => "{{",
            Region::Tag => "{%",
            Region::Comment => "{#",
        }
    }

    fn close(self) -> &'static str {
        match self {
            Region::Variable => "}}",
            Region::Tag => "%}",
            Region::Comment => "#}",
        }
    }
}

/// Maps byte offsets to line/column positions.
pub(crate) struct LineIndex<'a> {
    source: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        let starts = iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { source, starts }
    }

    pub(crate) fn position(&self, offset: usize) -> Position {
        let line = self.starts.partition_point(|&start| start <= offset);
        let line_start = self.starts[line - 1];
        let column = self.source[line_start..offset].chars().count() + 1;
        Position {
            line,
            column,
            offset,
        }
    }
}

/// Tokenize `source[start..]`, reporting positions relative to all of `source`.
///
/// The stream always ends with a single `Eof` token.
pub fn tokenize(source: &str, start: usize) -> Result<Vec<Token>, LexError> {
    let lines = LineIndex::new(source);
    let mut tokens = Vec::new();
    let mut cursor = start;

    while cursor < source.len() {
        let rest = &source[cursor..];
        let Some((found, region)) = next_region(rest) else {
            tokens.push(Token::new(TokenKind::Text, rest, lines.position(cursor)));
            break;
        };
        if found > 0 {
            tokens.push(Token::new(
                TokenKind::Text,
                &rest[..found],
                lines.position(cursor),
            ));
        }

        let open_at = cursor + found;
        let body_at = open_at + region.open().len();
        cursor = match region {
            Region::Comment => match source[body_at..].find(region.close()) {
                Some(end) => body_at + end + region.close().len(),
                None => {
                    return Err(LexError::Unterminated {
                        delimiter: region.open(),
                        position: lines.position(open_at),
                    });
                }
            },
            Region::Variable | Region::Tag => {
                let kind = match region {
                    Region::Variable => TokenKind::VarOpen,
                    Region::Tag | Region::Comment => TokenKind::TagOpen,
                };
                tokens.push(Token::new(kind, region.open(), lines.position(open_at)));
                lex_region(source, body_at, open_at, region, &lines, &mut tokens)?
            }
        };
    }

    tokens.push(Token::new(
        TokenKind::Eof,
        "",
        lines.position(source.len()),
    ));
    Ok(tokens)
}

/// Find the next opening delimiter in `text`.
fn next_region(text: &str) -> Option<(usize, Region)> {
    let bytes = text.as_bytes();
    text.match_indices('{').find_map(|(i, _)| {
        bytes
            .get(i + 1)
            .and_then(|&marker| Region::from_marker(marker))
            .map(|region| (i, region))
    })
}

/// Lex the inside of a `{{ }}` or `{% %}` region, returning the offset just
/// past its closing delimiter.
fn lex_region(
    source: &str,
    mut cursor: usize,
    open_at: usize,
    region: Region,
    lines: &LineIndex<'_>,
    tokens: &mut Vec<Token>,
) -> Result<usize, LexError> {
    let close = region.close();
    loop {
        let rest = &source[cursor..];
        let trimmed = rest.trim_start();
        cursor += rest.len() - trimmed.len();

        if trimmed.is_empty() {
            return Err(LexError::Unterminated {
                delimiter: region.open(),
                position: lines.position(open_at),
            });
        }
        if trimmed.starts_with(close) {
            let kind = match region {
                Region::Variable => TokenKind::VarClose,
                Region::Tag | Region::Comment => TokenKind::TagClose,
            };
            tokens.push(Token::new(kind, close, lines.position(cursor)));
            return Ok(cursor + close.len());
        }

        let after_dot = tokens.last().is_some_and(|t| t.kind == TokenKind::Dot);
        let mut input = trimmed;
        let lexed = if after_dot {
            alt((index_segment, region_token)).parse_next(&mut input)
        } else {
            region_token(&mut input)
        };

        let position = lines.position(cursor);
        match lexed {
            Ok((kind, text)) => {
                tokens.push(Token::new(kind, text, position));
                cursor += trimmed.len() - input.len();
            }
            Err(_) => {
                let found = trimmed.chars().next().unwrap_or_default();
                return Err(if found == '"' || found == '\'' {
                    LexError::UnterminatedString { position }
                } else {
                    LexError::UnexpectedCharacter { found, position }
                });
            }
        }
    }
}

/// Parse one token inside a region.
fn region_token(input: &mut &str) -> ModalResult<(TokenKind, String)> {
    alt((
        string_literal.map(|s| (TokenKind::StringLiteral, s)),
        number.map(|n: &str| (TokenKind::NumberLiteral, n.to_string())),
        identifier.map(|i: &str| (TokenKind::Ident, i.to_string())),
        operator.map(|o: &str| (TokenKind::Operator, o.to_string())),
        '.'.value((TokenKind::Dot, ".".to_string())),
        ','.value((TokenKind::Comma, ",".to_string())),
    ))
    .parse_next(input)
}

/// Parse a numeric path segment directly after a `.`: digits only, so
/// `items.0.1` stays a path instead of becoming the number `0.1`.
fn index_segment(input: &mut &str) -> ModalResult<(TokenKind, String)> {
    digits
        .map(|d: &str| (TokenKind::NumberLiteral, d.to_string()))
        .parse_next(input)
}

/// Parse a quoted string literal, returning its unescaped value.
fn string_literal(input: &mut &str) -> ModalResult<String> {
    let quote = one_of(['"', '\'']).parse_next(input)?;
    let value: String =
        repeat(0.., alt((escape_char, none_of([quote, '\\', '\n'])))).parse_next(input)?;
    one_of(quote).parse_next(input)?;
    Ok(value)
}

/// Parse an escape sequence inside a string literal.
fn escape_char(input: &mut &str) -> ModalResult<char> {
    preceded(
        '\\',
        alt((
            'n'.value('\n'),
            't'.value('\t'),
            '\\'.value('\\'),
            '"'.value('"'),
            '\''.value('\''),
        )),
    )
    .parse_next(input)
}

/// Parse a number: `-?[0-9]+(\.[0-9]+)?`.
fn number<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (opt('-'), digits, opt(('.', digits)))
        .take()
        .parse_next(input)
}

fn digits<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)
}

/// Parse an identifier.
fn identifier<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (one_of(is_ident_start), take_while(0.., is_ident_cont))
        .take()
        .parse_next(input)
}

/// Parse a comparison operator or parenthesis.
fn operator<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    alt(("==", "!=", "<=", ">=", "<", ">", "(", ")")).parse_next(input)
}

/// Check if a character can start an identifier.
fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Check if a character can continue an identifier.
fn is_ident_cont(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
