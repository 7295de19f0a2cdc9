//! Error types raised while rendering.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::parser::ast::{CompareOp, Position};

/// An error resolving `{% include %}`.
#[derive(Debug, Error)]
pub enum IncludeError {
    /// The included file could not be read.
    #[error("{included_from}:{position}: cannot include '{path}': {source}")]
    NotFound {
        path: PathBuf,
        included_from: PathBuf,
        position: Position,
        #[source]
        source: io::Error,
    },

    /// A template includes itself, directly or through other templates.
    #[error("circular include: {}", format_chain(chain))]
    Circular { chain: Vec<PathBuf> },

    /// Includes nested deeper than the configured limit.
    #[error("include depth limit of {max_depth} exceeded at '{path}'")]
    DepthExceeded { max_depth: usize, path: PathBuf },
}

/// An error evaluating an expression during rendering.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// An ordering comparison between operands that have no order.
    #[error("{position}: cannot compare {lhs} {op} {rhs}")]
    Incomparable {
        op: CompareOp,
        lhs: &'static str,
        rhs: &'static str,
        position: Position,
    },

    /// A path that does not resolve, under strict resolution.
    #[error("{position}: '{path}' is not defined")]
    Unresolved { path: String, position: Position },

    /// `{% for %}` over a value that is not an array, object or null.
    #[error("{position}: cannot iterate over {kind}")]
    NotIterable {
        kind: &'static str,
        position: Position,
    },
}

impl EvalError {
    pub fn position(&self) -> Position {
        match self {
            EvalError::Incomparable { position, .. }
            | EvalError::Unresolved { position, .. }
            | EvalError::NotIterable { position, .. } => *position,
        }
    }
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
