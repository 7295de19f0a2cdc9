//! Leading `@key: value` block extraction.
//!
//! Metadata lines must come first. Scanning stops at the first line that does
//! not start with `@`; that line begins the body. A blank line directly after
//! the block is treated as the separator and is not part of the body.

use winnow::combinator::preceded;
use winnow::prelude::*;
use winnow::token::{one_of, rest, take_while};

use super::error::MetadataError;
use crate::types::Metadata;

/// The metadata block of a source and where its body starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub metadata: Metadata,
    /// Byte offset of the first body character.
    pub body_start: usize,
}

/// Read the leading metadata lines of `source`.
pub fn extract_metadata(source: &str) -> Result<Extracted, MetadataError> {
    let mut metadata = Metadata::new();
    let mut offset = 0;
    let mut lines_read = 0;

    while offset < source.len() {
        let remaining = &source[offset..];
        let (raw_line, next) = match remaining.find('\n') {
            Some(end) => (&remaining[..end], offset + end + 1),
            None => (remaining, source.len()),
        };
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);

        if !line.starts_with('@') {
            if lines_read > 0 && line.trim().is_empty() {
                offset = next;
            }
            break;
        }

        lines_read += 1;
        let mut input = line;
        let (key, value) = metadata_line(&mut input).map_err(|_| MetadataError::Malformed {
            line: lines_read,
            content: line.to_string(),
        })?;
        metadata.insert(key, value.trim());
        offset = next;
    }

    Ok(Extracted {
        metadata,
        body_start: offset,
    })
}

/// Parse `@key:value`, returning the key and the untrimmed value.
fn metadata_line<'i>(input: &mut &'i str) -> ModalResult<(&'i str, &'i str)> {
    preceded('@', (key, preceded(':', rest))).parse_next(input)
}

fn key<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| {
            c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
        }),
    )
        .take()
        .parse_next(input)
}
