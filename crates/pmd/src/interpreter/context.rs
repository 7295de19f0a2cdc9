//! Render context carrying state through one render call.

use std::path::{Path, PathBuf};

use crate::interpreter::error::IncludeError;
use crate::interpreter::scope::Scope;
use crate::types::Value;

/// Default limit on include nesting.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 64;

/// What an unresolvable variable path evaluates to.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Missing paths evaluate to null.
    #[default]
    Lenient,
    /// Missing paths are an [`EvalError::Unresolved`](crate::EvalError::Unresolved).
    Strict,
}

/// State for a single render call.
///
/// The context tracks:
/// - The variable scope (root context plus loop frames)
/// - The stack of templates being rendered, for include cycle detection
/// - The include depth limit
/// - How unresolvable paths are treated
///
/// A context is never shared between render calls, so concurrent renders of
/// the same template cannot see each other's bindings or include stacks.
pub struct RenderContext<'a> {
    scope: Scope<'a>,
    /// Canonical paths of the templates currently being rendered, outermost
    /// first.
    include_stack: Vec<PathBuf>,
    max_depth: usize,
    resolution: Resolution,
}

impl<'a> RenderContext<'a> {
    /// Create a lenient context with the default depth limit.
    pub fn new(root: &'a Value) -> Self {
        Self::with_options(root, Resolution::default(), DEFAULT_MAX_INCLUDE_DEPTH)
    }

    pub fn with_options(root: &'a Value, resolution: Resolution, max_depth: usize) -> Self {
        Self {
            scope: Scope::new(root),
            include_stack: Vec::new(),
            max_depth,
            resolution,
        }
    }

    pub fn scope(&self) -> &Scope<'a> {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut Scope<'a> {
        &mut self.scope
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Record the top-level template. It counts for cycle detection but not
    /// towards the depth limit.
    pub fn enter_root(&mut self, path: PathBuf) {
        self.include_stack.clear();
        self.include_stack.push(path);
    }

    /// Check if a template is currently being rendered.
    pub fn is_rendering(&self, path: &Path) -> bool {
        self.include_stack.iter().any(|p| p == path)
    }

    /// Push an included template onto the stack.
    ///
    /// Returns error if:
    /// - `path` is already on the stack (checked first, so a self-include is
    ///   always reported as a cycle)
    /// - the include depth limit would be exceeded
    pub fn push_include(&mut self, path: PathBuf) -> Result<(), IncludeError> {
        if self.is_rendering(&path) {
            let mut chain = self.include_stack.clone();
            chain.push(path);
            return Err(IncludeError::Circular { chain });
        }
        if self.include_depth() >= self.max_depth {
            return Err(IncludeError::DepthExceeded {
                max_depth: self.max_depth,
                path,
            });
        }
        self.include_stack.push(path);
        Ok(())
    }

    /// Pop an included template from the stack.
    pub fn pop_include(&mut self) {
        if self.include_stack.len() > 1 {
            self.include_stack.pop();
        }
    }

    /// Number of includes currently nested below the top-level template.
    pub fn include_depth(&self) -> usize {
        self.include_stack.len().saturating_sub(1)
    }

    /// Get the include stack for error reporting.
    pub fn include_stack(&self) -> &[PathBuf] {
        &self.include_stack
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn include_stack_tracks_push_and_pop() {
        let root = Value::Null;
        let mut ctx = RenderContext::new(&root);
        ctx.enter_root(PathBuf::from("/t/main.pmd"));
        ctx.push_include(PathBuf::from("/t/part.pmd")).unwrap();
        assert_eq!(
            ctx.include_stack(),
            [PathBuf::from("/t/main.pmd"), PathBuf::from("/t/part.pmd")]
        );
        assert_eq!(ctx.include_depth(), 1);

        ctx.pop_include();
        ctx.pop_include();
        assert_eq!(ctx.include_stack(), [PathBuf::from("/t/main.pmd")]);
    }

    #[test]
    fn failed_push_leaves_stack_unchanged() {
        let root = Value::Null;
        let mut ctx = RenderContext::with_options(&root, Resolution::Lenient, 0);
        ctx.enter_root(PathBuf::from("/t/main.pmd"));
        assert!(matches!(
            ctx.push_include(PathBuf::from("/t/main.pmd")),
            Err(IncludeError::Circular { .. })
        ));
        assert!(matches!(
            ctx.push_include(PathBuf::from("/t/part.pmd")),
            Err(IncludeError::DepthExceeded { max_depth: 0, .. })
        ));
        assert_eq!(ctx.include_stack().len(), 1);
    }
}
