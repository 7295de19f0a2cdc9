//! Expression grammar shared by `{{ }}` and tag headers.
//!
//! Precedence, loosest first: `or`, `and`, comparison, `not`, primary.
//! `not` binds tighter than comparison, so `not a == b` compares `not a`
//! with `b`. Comparisons do not chain.

use super::ast::{CompareOp, Expr, VariablePath};
use super::error::ParseError;
use super::lexer::TokenKind;
use super::template::{RESERVED_WORDS, TokenParser};
use crate::types::Value;

impl TokenParser {
    /// Parse a full expression.
    pub(super) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_and()?;
        while self.peek().is_word("or") {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_comparison()?;
        while self.peek().is_word("and") {
            self.advance();
            let rhs = self.parse_comparison()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_unary()?;
        let token = self.peek();
        let op = match token.kind {
            TokenKind::Operator => CompareOp::from_symbol(&token.text),
            _ => None,
        };
        let Some(op) = op else {
            return Ok(lhs);
        };
        let position = self.advance().position;
        let rhs = self.parse_unary()?;
        Ok(Expr::Compare {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            position,
        })
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.peek().is_word("not") {
            let position = self.advance().position;
            self.enter(position)?;
            let operand = self.parse_unary()?;
            self.leave();
            return Ok(Expr::Not(Box::new(operand)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::StringLiteral => {
                self.advance();
                Ok(Expr::Literal(Value::String(token.text)))
            }
            TokenKind::NumberLiteral => {
                let number = token
                    .text
                    .parse::<f64>()
                    .map_err(|_| self.unexpected("number"))?;
                self.advance();
                Ok(Expr::Literal(Value::Number(number)))
            }
            TokenKind::Ident => match token.text.as_str() {
                "true" => {
                    self.advance();
                    Ok(Expr::Literal(Value::Bool(true)))
                }
                "false" => {
                    self.advance();
                    Ok(Expr::Literal(Value::Bool(false)))
                }
                "null" => {
                    self.advance();
                    Ok(Expr::Literal(Value::Null))
                }
                word if RESERVED_WORDS.contains(&word) => Err(self.unexpected("expression")),
                _ => self.parse_path().map(Expr::Path),
            },
            TokenKind::Operator if token.text == "(" => {
                self.advance();
                self.enter(token.position)?;
                let inner = self.parse_expression()?;
                if !self.peek().is_operator(")") {
                    return Err(self.unexpected("')'"));
                }
                self.advance();
                self.leave();
                Ok(inner)
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// Parse `name(.segment)*`, where a segment is an identifier or digits.
    fn parse_path(&mut self) -> Result<VariablePath, ParseError> {
        let first = self.advance();
        let mut segments = vec![first.text];
        while self.peek().kind == TokenKind::Dot {
            self.advance();
            let kind = self.peek().kind;
            match kind {
                TokenKind::Ident => segments.push(self.advance().text),
                TokenKind::NumberLiteral if is_index(&self.peek().text) => {
                    segments.push(self.advance().text);
                }
                _ => return Err(self.unexpected("path segment after '.'")),
            }
        }
        Ok(VariablePath {
            segments,
            position: first.position,
        })
    }
}

/// Whether a numeric token is a plain array index: digits only, no sign or
/// fraction.
fn is_index(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}
