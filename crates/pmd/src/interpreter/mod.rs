//! PMD interpreter for rendering templates.
//!
//! This module provides the rendering engine that takes parsed templates and
//! produces output text. It resolves variable paths against a scoped context,
//! evaluates conditions, runs loops and splices in included templates while
//! guarding against include cycles.

mod cache;
mod context;
mod engine;
mod error;
mod evaluator;
mod include;
mod loader;
mod scope;

pub use cache::TemplateCache;
pub use context::{DEFAULT_MAX_INCLUDE_DEPTH, RenderContext, Resolution};
pub use engine::{Engine, INLINE_TEMPLATE_PATH};
pub use error::{EvalError, IncludeError};
pub use evaluator::{compare, evaluate, render_template};
pub use include::IncludeResolver;
pub use loader::{FileSystemLoader, MemoryLoader, TemplateLoader, normalize_path};
pub use scope::Scope;
