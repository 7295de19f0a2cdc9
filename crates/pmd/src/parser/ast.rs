//! Public AST types for PMD templates.
//!
//! These types are public to enable external tooling (linters, formatters, etc.).
//! An AST is never mutated once the parser has produced it.

use std::fmt;

use crate::types::Value;

/// A location in the template source.
///
/// Lines and columns are 1-based; columns count characters, not bytes.
/// `offset` is the byte offset into the full source, metadata block included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A node in a template body.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text, copied to the output verbatim.
    Text(String),
    /// An interpolation: `{{ expr }}`.
    Variable { expr: Expr, position: Position },
    /// `{% if %}` with its `elif` branches and optional `else`.
    Conditional {
        branches: Vec<Branch>,
        else_body: Option<Vec<Node>>,
    },
    /// `{% for binding[, secondary] in source %}`.
    Loop {
        binding: String,
        secondary: Option<String>,
        source: Expr,
        body: Vec<Node>,
        position: Position,
    },
    /// `{% include "path" %}`, resolved relative to the including template.
    Include { path: String, position: Position },
}

/// One `if`/`elif` arm of a conditional.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub condition: Expr,
    pub body: Vec<Node>,
}

/// An expression inside `{{ }}` or a tag header.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A dotted lookup such as `user.name` or `items.0`.
    Path(VariablePath),
    /// `null`, `true`, `false`, a number or a string.
    Literal(Value),
    Compare {
        op: CompareOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        position: Position,
    },
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

/// A dotted variable path.
///
/// Segments are kept as written: numeric segments index into arrays and are
/// looked up as keys on objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariablePath {
    pub segments: Vec<String>,
    pub position: Position,
}

impl fmt::Display for VariablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    /// Map an operator lexeme to its comparison, if it is one.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "==" => Some(CompareOp::Eq),
            "!=" => Some(CompareOp::Ne),
            "<" => Some(CompareOp::Lt),
            "<=" => Some(CompareOp::Le),
            ">" => Some(CompareOp::Gt),
            ">=" => Some(CompareOp::Ge),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    /// Whether this operator orders its operands rather than testing equality.
    pub fn is_ordering(self) -> bool {
        !matches!(self, CompareOp::Eq | CompareOp::Ne)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
