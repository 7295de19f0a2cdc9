use std::path::{Path, PathBuf};

use crate::parser::ast::Node;
use crate::types::Metadata;

/// A parsed template: its metadata block and body AST.
///
/// A `Template` is immutable once the parser has built it. Includes inside it
/// resolve against `base_dir`, the directory holding the source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    path: PathBuf,
    base_dir: PathBuf,
    metadata: Metadata,
    nodes: Vec<Node>,
}

impl Template {
    pub(crate) fn new(path: PathBuf, metadata: Metadata, nodes: Vec<Node>) -> Self {
        let base_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self {
            path,
            base_dir,
            metadata,
            nodes,
        }
    }

    /// The path this template was parsed from (`<string>` for inline sources).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The directory includes are resolved against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The top-level body nodes.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}
