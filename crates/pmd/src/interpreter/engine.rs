//! The user-facing rendering engine.

use std::path::Path;
use std::sync::Arc;

use bon::Builder;

use crate::error::Error;
use crate::interpreter::cache::TemplateCache;
use crate::interpreter::context::{DEFAULT_MAX_INCLUDE_DEPTH, RenderContext, Resolution};
use crate::interpreter::evaluator::render_template;
use crate::interpreter::include::IncludeResolver;
use crate::interpreter::loader::{FileSystemLoader, TemplateLoader};
use crate::parser::parse_template;
use crate::types::{Template, Value};

/// Path recorded on templates rendered from inline strings.
pub const INLINE_TEMPLATE_PATH: &str = "<string>";

/// Loads, caches and renders PMD templates.
///
/// An engine owns a loader and a cache of parsed templates keyed by canonical
/// path. Everything takes `&self`, and the engine is `Send + Sync`, so one
/// engine can serve renders from many threads at once. Each render gets its
/// own [`RenderContext`]; only parsed templates are shared.
///
/// # Example
///
/// ```
/// use pmd::{Engine, Value};
///
/// let engine = Engine::builder().build();
/// let context = Value::from_json(r#"{"items": ["a", "b"]}"#).unwrap();
/// let output = engine
///     .render_str("{% for item in items %}- {{ item }}\n{% endfor %}", &context)
///     .unwrap();
/// assert_eq!(output, "- a\n- b\n");
/// ```
#[derive(Builder)]
pub struct Engine {
    /// Where template sources are read from.
    #[builder(default = default_loader())]
    loader: Box<dyn TemplateLoader>,

    /// How unresolvable variable paths are treated.
    #[builder(default)]
    resolution: Resolution,

    /// Maximum include nesting below the top-level template.
    #[builder(default = DEFAULT_MAX_INCLUDE_DEPTH)]
    max_include_depth: usize,

    /// Parsed templates, shared by every render.
    #[builder(skip)]
    cache: TemplateCache,
}

fn default_loader() -> Box<dyn TemplateLoader> {
    Box::new(FileSystemLoader)
}

impl Default for Engine {
    fn default() -> Self {
        Engine::builder().build()
    }
}

impl Engine {
    /// Create an engine that reads from the filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with a custom loader and default settings.
    pub fn with_loader(loader: impl TemplateLoader + 'static) -> Self {
        Engine::builder().loader(Box::new(loader)).build()
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn max_include_depth(&self) -> usize {
        self.max_include_depth
    }

    pub fn loader(&self) -> &dyn TemplateLoader {
        self.loader.as_ref()
    }

    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    // =========================================================================
    // Parsing
    // =========================================================================

    /// Parse template text without caching it.
    pub fn parse_str(&self, source: &str, path: impl AsRef<Path>) -> Result<Template, Error> {
        parse_template(source, path)
    }

    /// Load and parse the template at `path`, using the cache.
    ///
    /// Parse failures are returned but not cached, so a fixed file can be
    /// loaded again without invalidating it.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Arc<Template>, Error> {
        let path = self.loader.canonicalize(path.as_ref());
        self.cache.get_or_try_insert_with(&path, || {
            let source = self.loader.load(&path).map_err(|source| Error::Io {
                path: path.clone(),
                source,
            })?;
            parse_template(&source, &path)
        })
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Render a parsed template against `context`.
    ///
    /// `context` is the root scope. It is usually an object; any other value
    /// leaves every path unresolved.
    pub fn render(&self, template: &Template, context: &Value) -> Result<String, Error> {
        let mut ctx =
            RenderContext::with_options(context, self.resolution, self.max_include_depth);
        ctx.enter_root(self.loader.canonicalize(template.path()));
        let resolver = IncludeResolver::new(self.loader.as_ref(), &self.cache);
        let output = render_template(template, &mut ctx, &resolver)?;
        log::debug!(
            "rendered {} ({} bytes)",
            template.path().display(),
            output.len()
        );
        Ok(output)
    }

    /// Load the template at `path` and render it.
    pub fn render_file(&self, path: impl AsRef<Path>, context: &Value) -> Result<String, Error> {
        let template = self.load(path)?;
        self.render(&template, context)
    }

    /// Parse and render inline template text.
    ///
    /// Includes resolve relative to the current directory.
    pub fn render_str(&self, source: &str, context: &Value) -> Result<String, Error> {
        let template = parse_template(source, INLINE_TEMPLATE_PATH)?;
        self.render(&template, context)
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Drop the cached template for `path`. Returns whether one was cached.
    pub fn invalidate(&self, path: impl AsRef<Path>) -> bool {
        let path = self.loader.canonicalize(path.as_ref());
        self.cache.invalidate(&path)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
