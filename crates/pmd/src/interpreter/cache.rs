//! Shared cache of parsed templates.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::types::Template;

/// Parsed templates keyed by canonical path.
///
/// Safe to share between threads. A template is parsed outside the lock, so
/// two threads missing on the same path may both parse it; the first insert
/// wins and both observe the same `Arc`. Failed parses are not cached.
#[derive(Debug, Default)]
pub struct TemplateCache {
    templates: RwLock<HashMap<PathBuf, Arc<Template>>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached template for `path`, if any.
    pub fn get(&self, path: &Path) -> Option<Arc<Template>> {
        self.read().get(path).cloned()
    }

    /// The cached template for `path`, or the result of `parse` inserted
    /// under `path` when there is none.
    pub fn get_or_try_insert_with<E>(
        &self,
        path: &Path,
        parse: impl FnOnce() -> Result<Template, E>,
    ) -> Result<Arc<Template>, E> {
        if let Some(template) = self.get(path) {
            log::trace!("template cache hit for {}", path.display());
            return Ok(template);
        }
        let parsed = Arc::new(parse()?);
        log::debug!("caching template {}", path.display());
        let mut templates = self.write();
        let entry = templates.entry(path.to_path_buf()).or_insert(parsed);
        Ok(Arc::clone(entry))
    }

    /// Drop the entry for `path`. Returns whether one was present.
    pub fn invalidate(&self, path: &Path) -> bool {
        self.write().remove(path).is_some()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.read().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A panic while holding the lock cannot leave the map half-updated, so a
    // poisoned lock is still usable.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<PathBuf, Arc<Template>>> {
        self.templates.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<PathBuf, Arc<Template>>> {
        self.templates.write().unwrap_or_else(PoisonError::into_inner)
    }
}
