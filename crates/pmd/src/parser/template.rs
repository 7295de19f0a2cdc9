//! Recursive-descent parser from tokens to template nodes.
//!
//! Structure is validated completely here: every `if` and `for` must be
//! closed by its own end tag, and branch tags must sit inside the block they
//! belong to. Nothing reaches the renderer unless the whole body parses.

use strsim::levenshtein;

use super::ast::{Branch, Node, Position};
use super::error::ParseError;
use super::lexer::{Token, TokenKind};

/// Tag keywords that open or continue a block.
const TAG_KEYWORDS: &[&str] = &["if", "elif", "else", "endif", "for", "endfor", "include"];

/// Tags that may end the body of an `if` branch.
const IF_STOPS: &[&str] = &["elif", "else", "endif"];

/// Tags that may end the body of a `for` loop.
const FOR_STOPS: &[&str] = &["endfor"];

/// Words that cannot name a variable.
pub(super) const RESERVED_WORDS: &[&str] = &[
    "and", "or", "not", "in", "true", "false", "null", "if", "elif", "else", "endif", "for",
    "endfor", "include",
];

/// Deepest nesting of blocks, `not` operators and parentheses a template
/// may use. Parsing and rendering recurse once per level.
pub const MAX_NESTING_DEPTH: usize = 64;

/// The tag that ended a block body.
struct EndTag {
    keyword: &'static str,
    position: Position,
}

/// Parse a token stream into body nodes.
pub fn parse_tokens(tokens: Vec<Token>) -> Result<Vec<Node>, ParseError> {
    let mut parser = TokenParser::new(tokens);
    let (nodes, _) = parser.parse_block(&[], None)?;
    Ok(nodes)
}

/// Cursor over a token stream that always ends in `Eof`.
pub(super) struct TokenParser {
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
}

impl TokenParser {
    fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let position = tokens.last().map(|t| t.position).unwrap_or_default();
            tokens.push(Token {
                kind: TokenKind::Eof,
                text: String::new(),
                position,
            });
        }
        Self {
            tokens,
            position: 0,
            depth: 0,
        }
    }

    /// The current token, without consuming it.
    pub(super) fn peek(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.position.min(last)]
    }

    /// Consume the current token. `Eof` is never consumed.
    pub(super) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    /// Consume a token of `kind` or fail describing what was `expected`.
    pub(super) fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        if self.peek().kind == kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    /// An error for the current token.
    pub(super) fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        ParseError::UnexpectedToken {
            found: token.to_string(),
            expected: expected.to_string(),
            position: token.position,
        }
    }

    /// Enter one nesting level opened at `position`.
    pub(super) fn enter(&mut self, position: Position) -> Result<(), ParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::NestingTooDeep {
                limit: MAX_NESTING_DEPTH,
                position,
            });
        }
        self.depth += 1;
        Ok(())
    }

    pub(super) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn expect_tag_close(&mut self) -> Result<Token, ParseError> {
        self.expect(TokenKind::TagClose, "'%}'")
    }

    /// Parse nodes until end of input or one of the `stops` tags.
    ///
    /// `closer` names the end tag of the enclosing block, for diagnostics.
    /// Returns `None` as the end tag when input ran out.
    fn parse_block(
        &mut self,
        stops: &[&str],
        closer: Option<&'static str>,
    ) -> Result<(Vec<Node>, Option<EndTag>), ParseError> {
        let mut nodes = Vec::new();
        loop {
            let kind = self.peek().kind;
            match kind {
                TokenKind::Eof => return Ok((nodes, None)),
                TokenKind::Text => {
                    let text = self.advance().text;
                    push_text(&mut nodes, text);
                }
                TokenKind::VarOpen => {
                    let open = self.advance();
                    if self.peek().kind == TokenKind::VarClose {
                        return Err(self.unexpected("expression"));
                    }
                    let expr = self.parse_expression()?;
                    self.expect(TokenKind::VarClose, "'}}'")?;
                    nodes.push(Node::Variable {
                        expr,
                        position: open.position,
                    });
                }
                TokenKind::TagOpen => {
                    let open = self.advance();
                    let name = self.peek().clone();
                    if name.kind != TokenKind::Ident {
                        return Err(self.unexpected("tag name"));
                    }
                    let keyword = match name.text.as_str() {
                        "if" => {
                            self.advance();
                            self.enter(open.position)?;
                            nodes.push(self.parse_if(open.position)?);
                            self.leave();
                            continue;
                        }
                        "for" => {
                            self.advance();
                            self.enter(open.position)?;
                            nodes.push(self.parse_for(open.position)?);
                            self.leave();
                            continue;
                        }
                        "include" => {
                            self.advance();
                            nodes.push(self.parse_include(open.position)?);
                            continue;
                        }
                        "elif" => "elif",
                        "else" => "else",
                        "endif" => "endif",
                        "endfor" => "endfor",
                        other => {
                            return Err(ParseError::UnknownTag {
                                name: other.to_string(),
                                suggestion: suggest_tag(other),
                                position: name.position,
                            });
                        }
                    };
                    if !stops.contains(&keyword) {
                        return Err(ParseError::UnexpectedTag {
                            keyword: keyword.to_string(),
                            expected: closer,
                            position: open.position,
                        });
                    }
                    self.advance();
                    return Ok((
                        nodes,
                        Some(EndTag {
                            keyword,
                            position: open.position,
                        }),
                    ));
                }
                TokenKind::VarClose
                | TokenKind::TagClose
                | TokenKind::Ident
                | TokenKind::StringLiteral
                | TokenKind::NumberLiteral
                | TokenKind::Operator
                | TokenKind::Dot
                | TokenKind::Comma => return Err(self.unexpected("text or a tag")),
            }
        }
    }

    /// Parse the rest of an `if` tag and everything up to its `endif`.
    fn parse_if(&mut self, open: Position) -> Result<Node, ParseError> {
        let mut condition = self.parse_expression()?;
        self.expect_tag_close()?;

        let mut branches = Vec::new();
        loop {
            let (body, end) = self.parse_block(IF_STOPS, Some("endif"))?;
            let Some(end) = end else {
                return Err(ParseError::Unclosed {
                    keyword: "if",
                    position: open,
                });
            };
            branches.push(Branch { condition, body });
            match end.keyword {
                "elif" => {
                    condition = self.parse_expression()?;
                    self.expect_tag_close()?;
                }
                "else" => {
                    self.expect_tag_close()?;
                    let else_body = self.parse_else(open)?;
                    return Ok(Node::Conditional {
                        branches,
                        else_body: Some(else_body),
                    });
                }
                _ => {
                    self.expect_tag_close()?;
                    return Ok(Node::Conditional {
                        branches,
                        else_body: None,
                    });
                }
            }
        }
    }

    /// Parse an `else` body, which only `endif` may end.
    fn parse_else(&mut self, open: Position) -> Result<Vec<Node>, ParseError> {
        let (body, end) = self.parse_block(IF_STOPS, Some("endif"))?;
        match end {
            None => Err(ParseError::Unclosed {
                keyword: "if",
                position: open,
            }),
            Some(end) if end.keyword == "endif" => {
                self.expect_tag_close()?;
                Ok(body)
            }
            Some(end) => Err(ParseError::BranchAfterElse {
                keyword: end.keyword,
                position: end.position,
            }),
        }
    }

    /// Parse `name[, name] in expr %}`, the body and its `endfor`.
    fn parse_for(&mut self, open: Position) -> Result<Node, ParseError> {
        let binding = self.binding_name()?;
        let secondary = if self.peek().kind == TokenKind::Comma {
            self.advance();
            Some(self.binding_name()?)
        } else {
            None
        };
        if !self.peek().is_word("in") {
            return Err(self.unexpected("'in'"));
        }
        self.advance();
        let source = self.parse_expression()?;
        self.expect_tag_close()?;

        let (body, end) = self.parse_block(FOR_STOPS, Some("endfor"))?;
        if end.is_none() {
            return Err(ParseError::Unclosed {
                keyword: "for",
                position: open,
            });
        }
        self.expect_tag_close()?;

        Ok(Node::Loop {
            binding,
            secondary,
            source,
            body,
            position: open,
        })
    }

    /// Parse `"path" %}`. Only string literal paths are accepted.
    fn parse_include(&mut self, open: Position) -> Result<Node, ParseError> {
        let path = self.peek().clone();
        if path.kind != TokenKind::StringLiteral {
            return Err(ParseError::NonLiteralInclude {
                position: path.position,
            });
        }
        self.advance();
        self.expect_tag_close()?;
        Ok(Node::Include {
            path: path.text,
            position: open,
        })
    }

    /// A loop variable name: an identifier that is not a reserved word.
    fn binding_name(&mut self) -> Result<String, ParseError> {
        let token = self.peek();
        if token.kind == TokenKind::Ident && !RESERVED_WORDS.contains(&token.text.as_str()) {
            Ok(self.advance().text)
        } else {
            Err(self.unexpected("loop variable name"))
        }
    }
}

/// Append text, merging it into a preceding text node.
fn push_text(nodes: &mut Vec<Node>, text: String) {
    if let Some(Node::Text(prev)) = nodes.last_mut() {
        prev.push_str(&text);
    } else {
        nodes.push(Node::Text(text));
    }
}

/// The closest known tag keyword to a misspelled one.
fn suggest_tag(name: &str) -> Option<String> {
    let max_distance = if name.len() <= 3 { 1 } else { 2 };
    TAG_KEYWORDS
        .iter()
        .map(|candidate| (levenshtein(name, candidate), candidate))
        .filter(|(dist, _)| *dist <= max_distance && *dist > 0)
        .min_by_key(|(dist, _)| *dist)
        .map(|(_, candidate)| (*candidate).to_string())
}
