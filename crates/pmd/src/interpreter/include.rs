//! Resolution of `{% include %}` tags.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Error;
use crate::interpreter::cache::TemplateCache;
use crate::interpreter::context::RenderContext;
use crate::interpreter::error::IncludeError;
use crate::interpreter::loader::TemplateLoader;
use crate::parser::ast::Position;
use crate::parser::parse_template;
use crate::types::Template;

/// Locates, loads and caches included templates.
pub struct IncludeResolver<'e> {
    loader: &'e dyn TemplateLoader,
    cache: &'e TemplateCache,
}

impl<'e> IncludeResolver<'e> {
    pub fn new(loader: &'e dyn TemplateLoader, cache: &'e TemplateCache) -> Self {
        Self { loader, cache }
    }

    /// Canonical path of `include` written inside `from`.
    pub fn resolve_path(&self, from: &Template, include: &str) -> PathBuf {
        self.loader.canonicalize(&from.base_dir().join(include))
    }

    /// Enter an include: check it against the in-progress stack, push it, and
    /// return the parsed template.
    ///
    /// The cycle check happens before the cache is consulted. On success the
    /// caller must call [`RenderContext::pop_include`] once the included
    /// template has been rendered; on failure nothing is left pushed.
    pub fn enter(
        &self,
        ctx: &mut RenderContext<'_>,
        from: &Template,
        include: &str,
        position: Position,
    ) -> Result<Arc<Template>, Error> {
        let path = self.resolve_path(from, include);
        ctx.push_include(path.clone())?;
        log::trace!(
            "including {} from {} at depth {}",
            path.display(),
            from.path().display(),
            ctx.include_depth()
        );
        let loaded = self.load(&path, from, position);
        if loaded.is_err() {
            ctx.pop_include();
        }
        loaded
    }

    fn load(
        &self,
        path: &Path,
        from: &Template,
        position: Position,
    ) -> Result<Arc<Template>, Error> {
        self.cache.get_or_try_insert_with(path, || {
            let source = self
                .loader
                .load(path)
                .map_err(|source| IncludeError::NotFound {
                    path: path.to_path_buf(),
                    included_from: from.path().to_path_buf(),
                    position,
                    source,
                })?;
            parse_template(&source, path)
        })
    }
}
