//! Template source loading.

use std::collections::HashMap;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Component, Path, PathBuf, absolute};

/// Reads template sources by path.
///
/// Loaders are shared between threads by [`Engine`](crate::Engine), so they
/// must be `Send + Sync`.
pub trait TemplateLoader: Send + Sync {
    /// Read the source text at `path`.
    fn load(&self, path: &Path) -> io::Result<String>;

    /// The canonical form of `path`, used as the cache key and for include
    /// cycle detection. Two paths naming the same template must canonicalise
    /// to the same value.
    fn canonicalize(&self, path: &Path) -> PathBuf {
        normalize_path(path)
    }
}

/// Loads templates from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSystemLoader;

impl TemplateLoader for FileSystemLoader {
    fn load(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    /// Resolves symlinks when the file exists, and falls back to a lexical
    /// absolute path otherwise so that missing files still get a stable key.
    fn canonicalize(&self, path: &Path) -> PathBuf {
        fs::canonicalize(path).unwrap_or_else(|_| {
            normalize_path(&absolute(path).unwrap_or_else(|_| path.to_path_buf()))
        })
    }
}

/// Serves templates from memory. Useful for tests and embedding.
///
/// # Example
///
/// ```
/// use pmd::{Engine, MemoryLoader, Value};
///
/// let loader = MemoryLoader::new()
///     .with_template("main.pmd", "[{% include \"part.pmd\" %}]")
///     .with_template("part.pmd", "part");
/// let engine = Engine::with_loader(loader);
/// assert_eq!(engine.render_file("main.pmd", &Value::Null).unwrap(), "[part]");
/// ```
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    sources: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a template.
    pub fn insert(&mut self, path: impl AsRef<Path>, source: impl Into<String>) {
        self.sources
            .insert(normalize_path(path.as_ref()), source.into());
    }

    /// Builder-style [`MemoryLoader::insert`].
    pub fn with_template(mut self, path: impl AsRef<Path>, source: impl Into<String>) -> Self {
        self.insert(path, source);
        self
    }
}

impl TemplateLoader for MemoryLoader {
    fn load(&self, path: &Path) -> io::Result<String> {
        self.sources
            .get(&normalize_path(path))
            .cloned()
            .ok_or_else(|| io::Error::new(ErrorKind::NotFound, "no such template"))
    }
}

/// Lexically normalise a path: drop `.` components and fold `..` into the
/// preceding normal component. The filesystem is not consulted.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                Some(Component::ParentDir | Component::CurDir) | None => normalized.push(".."),
            },
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                normalized.push(component.as_os_str());
            }
        }
    }
    if normalized.as_os_str().is_empty() {
        normalized.push(".");
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_parent_components() {
        assert_eq!(
            normalize_path(Path::new("a/./b/../c.pmd")),
            PathBuf::from("a/c.pmd")
        );
        assert_eq!(
            normalize_path(Path::new("../x/../y")),
            PathBuf::from("../y")
        );
        assert_eq!(normalize_path(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize_path(Path::new("a/..")), PathBuf::from("."));
    }

    #[test]
    fn memory_loader_matches_equivalent_paths() {
        let loader = MemoryLoader::new().with_template("dir/a.pmd", "A");
        assert_eq!(loader.load(Path::new("./dir/x/../a.pmd")).unwrap(), "A");
        assert_eq!(
            loader.load(Path::new("b.pmd")).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
}
