//! PMD template parser.
//!
//! This module turns template text into a [`Template`]: the metadata block
//! is extracted first, then the body is lexed and parsed into an AST that can
//! be used for rendering or external tooling.

pub mod ast;
pub mod error;
mod expr;
pub mod lexer;
pub mod metadata;
mod template;

use std::path::Path;

pub use ast::*;
pub use error::{LexError, MetadataError, ParseError};
pub use lexer::{Token, TokenKind, tokenize};
pub use metadata::{Extracted, extract_metadata};
pub use template::{MAX_NESTING_DEPTH, parse_tokens};

use crate::error::Error;
use crate::types::Template;

/// Parse template text into a [`Template`].
///
/// `path` is recorded on the template and in errors; includes resolve
/// relative to its parent directory. All static errors (metadata, lexing,
/// structure) are reported here, before any rendering.
///
/// # Example
///
/// ```
/// use pmd::parser::parse_template;
///
/// let template = parse_template("@task: greet\n\nHello, {{ name }}!", "greet.pmd").unwrap();
/// assert_eq!(template.metadata().get("task"), Some("greet"));
/// assert_eq!(template.nodes().len(), 3);
/// ```
pub fn parse_template(source: &str, path: impl AsRef<Path>) -> Result<Template, Error> {
    let path = path.as_ref();
    let Extracted {
        metadata,
        body_start,
    } = extract_metadata(source).map_err(|source| Error::Metadata {
        path: path.to_path_buf(),
        source,
    })?;
    let tokens = tokenize(source, body_start).map_err(|source| Error::Lex {
        path: path.to_path_buf(),
        source,
    })?;
    let nodes = parse_tokens(tokens).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!(
        "parsed template {} ({} metadata keys, {} top-level nodes)",
        path.display(),
        metadata.len(),
        nodes.len()
    );
    Ok(Template::new(path.to_path_buf(), metadata, nodes))
}
