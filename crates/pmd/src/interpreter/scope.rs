//! Variable lookup during rendering.

use indexmap::IndexMap;

use crate::parser::ast::VariablePath;
use crate::types::Value;

/// A stack of loop frames over the root context object.
///
/// Lookup of a path's first segment checks frames innermost first, then the
/// root. Loop bindings therefore shadow root keys of the same name, and the
/// shadowing ends when the frame is popped.
#[derive(Debug)]
pub struct Scope<'a> {
    root: &'a Value,
    frames: Vec<IndexMap<String, Value>>,
}

impl<'a> Scope<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self {
            root,
            frames: Vec::new(),
        }
    }

    /// Push a frame holding `bindings`.
    pub fn push_frame(&mut self, bindings: impl IntoIterator<Item = (String, Value)>) {
        self.frames.push(bindings.into_iter().collect());
    }

    /// Pop the innermost frame.
    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Number of frames currently pushed.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Look up a single name.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name))
            .or_else(|| self.root.as_object().and_then(|root| root.get(name)))
    }

    /// Resolve a dotted path. `None` when any segment is missing.
    pub fn resolve(&self, path: &VariablePath) -> Option<&Value> {
        let (first, rest) = path.segments.split_first()?;
        rest.iter()
            .try_fold(self.lookup(first)?, |value, segment| value.get(segment))
    }
}
