//! Static error types: everything detected before rendering starts.

use thiserror::Error;

use super::ast::Position;

/// An error raised while splitting template text into tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// An opening delimiter with no matching close before end of input.
    #[error("{position}: unterminated '{delimiter}'")]
    Unterminated {
        delimiter: &'static str,
        position: Position,
    },

    /// A string literal with no closing quote on its line.
    #[error("{position}: unterminated string literal")]
    UnterminatedString { position: Position },

    /// A character that cannot start any token inside `{{ }}` or `{% %}`.
    #[error("{position}: unexpected character '{found}'")]
    UnexpectedCharacter { found: char, position: Position },
}

impl LexError {
    pub fn position(&self) -> Position {
        match self {
            LexError::Unterminated { position, .. }
            | LexError::UnterminatedString { position }
            | LexError::UnexpectedCharacter { position, .. } => *position,
        }
    }
}

/// An error in the leading `@key: value` block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    /// A line starting with `@` that is not shaped `@key: value`.
    #[error("line {line}: malformed metadata '{content}', expected '@key: value'")]
    Malformed { line: usize, content: String },
}

impl MetadataError {
    pub fn line(&self) -> usize {
        match self {
            MetadataError::Malformed { line, .. } => *line,
        }
    }
}

/// A structural or grammatical error in the template body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// `{% name %}` where `name` is not a known tag.
    #[error("{position}: unknown tag '{name}'{}", did_you_mean(suggestion.as_deref()))]
    UnknownTag {
        name: String,
        suggestion: Option<String>,
        position: Position,
    },

    /// A block opened by `keyword` never reached its end tag.
    #[error("{position}: '{keyword}' block is never closed")]
    Unclosed {
        keyword: &'static str,
        position: Position,
    },

    /// A branch or end tag with no matching opener, or closing the wrong block.
    #[error("{position}: unexpected '{keyword}'{}", expected_block(*expected))]
    UnexpectedTag {
        keyword: String,
        expected: Option<&'static str>,
        position: Position,
    },

    /// `elif` or a second `else` following `else`.
    #[error("{position}: '{keyword}' cannot follow 'else'")]
    BranchAfterElse {
        keyword: &'static str,
        position: Position,
    },

    /// A token that does not fit the grammar at this point.
    #[error("{position}: expected {expected}, found {found}")]
    UnexpectedToken {
        found: String,
        expected: String,
        position: Position,
    },

    /// `{% include %}` with anything but a string literal path.
    #[error("{position}: include path must be a string literal")]
    NonLiteralInclude { position: Position },

    /// Blocks, `not` operators or parentheses nested past `limit` levels.
    #[error("{position}: nesting exceeds the limit of {limit} levels")]
    NestingTooDeep { limit: usize, position: Position },
}

impl ParseError {
    pub fn position(&self) -> Position {
        match self {
            ParseError::UnknownTag { position, .. }
            | ParseError::Unclosed { position, .. }
            | ParseError::UnexpectedTag { position, .. }
            | ParseError::BranchAfterElse { position, .. }
            | ParseError::UnexpectedToken { position, .. }
            | ParseError::NonLiteralInclude { position }
            | ParseError::NestingTooDeep { position, .. } => *position,
        }
    }
}

fn did_you_mean(suggestion: Option<&str>) -> String {
    suggestion
        .map(|s| format!(", did you mean '{s}'?"))
        .unwrap_or_default()
}

fn expected_block(expected: Option<&str>) -> String {
    match expected {
        Some(keyword) => format!(", expected '{keyword}'"),
        None => " outside of any block".to_string(),
    }
}
