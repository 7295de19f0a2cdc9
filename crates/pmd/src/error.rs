//! The unified error type for parsing and rendering.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::interpreter::{EvalError, IncludeError};
use crate::parser::ast::Position;
use crate::parser::error::{LexError, MetadataError, ParseError};

/// Any failure turning a template file into output.
///
/// Lex, metadata and parse errors are static: they are raised before
/// rendering begins. Include and evaluation errors are raised during the
/// render walk. Either way no partial output is produced.
#[derive(Debug, Error)]
pub enum Error {
    /// A top-level template file could not be read.
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path}:{source}")]
    Lex {
        path: PathBuf,
        #[source]
        source: LexError,
    },

    #[error("{path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: MetadataError,
    },

    #[error("{path}:{source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Include(#[from] IncludeError),

    #[error("{path}:{source}")]
    Eval {
        path: PathBuf,
        #[source]
        source: EvalError,
    },
}

impl Error {
    /// Whether this error was detected before rendering started.
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            Error::Lex { .. } | Error::Metadata { .. } | Error::Parse { .. }
        )
    }

    /// The template file the error belongs to.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Error::Io { path, .. }
            | Error::Lex { path, .. }
            | Error::Metadata { path, .. }
            | Error::Parse { path, .. }
            | Error::Eval { path, .. } => Some(path),
            Error::Include(IncludeError::NotFound { included_from, .. }) => Some(included_from),
            Error::Include(IncludeError::Circular { chain }) => chain.last().map(PathBuf::as_path),
            Error::Include(IncludeError::DepthExceeded { path, .. }) => Some(path),
        }
    }

    /// Where in [`Error::path`] the error occurred, when known.
    ///
    /// Metadata errors only know their line and report column 1.
    pub fn position(&self) -> Option<Position> {
        match self {
            Error::Lex { source, .. } => Some(source.position()),
            Error::Parse { source, .. } => Some(source.position()),
            Error::Eval { source, .. } => Some(source.position()),
            Error::Metadata { source, .. } => Some(Position {
                line: source.line(),
                column: 1,
                offset: 0,
            }),
            Error::Include(IncludeError::NotFound { position, .. }) => Some(*position),
            Error::Io { .. }
            | Error::Include(IncludeError::Circular { .. } | IncludeError::DepthExceeded { .. }) => {
                None
            }
        }
    }
}
