//! Miette diagnostic wrapper for PMD template errors.
//!
//! Note: This module has an exception for `unused_assignments` because miette
//! derive macros read struct fields in generated code that rustc cannot track.
#![allow(unused_assignments)]

use std::fs::read_to_string;

use miette::{Diagnostic, NamedSource, SourceSpan};
use pmd::parser::Position;
use pmd::{Error, EvalError, IncludeError, ParseError};
use thiserror::Error;

/// A miette-compatible diagnostic for a template error with a location.
///
/// Note: Fields are read by miette derive macros, not directly by code.
#[derive(Debug, Error, Diagnostic)]
#[error("{kind}: {message}")]
#[diagnostic(code(pmd::template))]
pub struct TemplateDiagnostic {
    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: SourceSpan,

    kind: &'static str,

    message: String,

    #[help]
    help: Option<String>,
}

impl TemplateDiagnostic {
    /// Create a diagnostic from an error and the text of the file it points at.
    ///
    /// Returns `None` when the error carries no location.
    pub fn new(err: &Error, content: &str) -> Option<Self> {
        let path = err.path()?;
        let position = err.position()?;
        let offset = byte_offset(content, position);
        Some(TemplateDiagnostic {
            src: NamedSource::new(path.display().to_string(), content.to_string()),
            span: (offset, 1).into(),
            kind: if err.is_static() {
                "syntax error"
            } else {
                "render error"
            },
            message: err.to_string(),
            help: help_for(err),
        })
    }

    /// Create a diagnostic by reading the file the error points at.
    pub fn from_error(err: &Error) -> Option<Self> {
        let content = read_to_string(err.path()?).ok()?;
        Self::new(err, &content)
    }
}

/// Print an error to stderr, with a source snippet when it has a location.
pub fn report_error(err: &Error) {
    match TemplateDiagnostic::from_error(err) {
        Some(diagnostic) => eprintln!("{:?}", miette::Report::new(diagnostic)),
        None => eprintln!("{:?}", miette::miette!("{err}")),
    }
}

fn help_for(err: &Error) -> Option<String> {
    match err {
        Error::Parse {
            source: ParseError::NonLiteralInclude { .. },
            ..
        } => Some("include paths must be quoted, e.g. {% include \"header.pmd\" %}".into()),
        Error::Parse {
            source: ParseError::Unclosed { keyword, .. },
            ..
        } => Some(format!("add a matching {{% end{keyword} %}}")),
        Error::Parse {
            source: ParseError::NestingTooDeep { .. },
            ..
        } => Some("split the template into smaller parts with {% include %}".into()),
        Error::Eval {
            source: EvalError::Unresolved { .. },
            ..
        } => Some("pass it with --var or the context file, or render without --strict".into()),
        Error::Include(IncludeError::NotFound { path, .. }) => Some(format!(
            "include paths are relative to the including template; looked for {}",
            path.display()
        )),
        _ => None,
    }
}

/// Convert a 1-based line and character column into a byte offset.
///
/// The result is clamped to the content length so that miette never sees an
/// out-of-bounds span.
fn byte_offset(content: &str, position: Position) -> usize {
    let line_start: usize = content
        .split_inclusive('\n')
        .take(position.line.saturating_sub(1))
        .map(str::len)
        .sum();
    let column: usize = content[line_start..]
        .chars()
        .take(position.column.saturating_sub(1))
        .map(char::len_utf8)
        .sum();
    (line_start + column).min(content.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(line: usize, column: usize) -> Position {
        Position {
            line,
            column,
            offset: 0,
        }
    }

    #[test]
    fn offsets_count_characters_within_a_line() {
        let content = "ab\nçé{{ x";
        assert_eq!(byte_offset(content, at(1, 1)), 0);
        assert_eq!(byte_offset(content, at(2, 3)), "ab\nçé".len());
    }

    #[test]
    fn offsets_are_clamped() {
        assert_eq!(byte_offset("short", at(9, 9)), 5);
    }

    #[test]
    fn diagnostic_requires_a_location() {
        let err = pmd::parse_template("{% if x %}", "t.pmd").unwrap_err();
        assert!(TemplateDiagnostic::new(&err, "{% if x %}").is_some());

        let err = Error::Include(IncludeError::Circular { chain: vec![] });
        assert!(TemplateDiagnostic::new(&err, "").is_none());
    }
}
