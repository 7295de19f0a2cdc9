use std::fmt;

use indexmap::IndexMap;
use indexmap::map::Iter;
use serde::Serialize;

/// The leading `@key: value` block of a template.
///
/// Keys keep the order in which they were first seen. A repeated key
/// overwrites the earlier value without moving.
///
/// # Example
///
/// ```
/// use pmd::Metadata;
///
/// let mut metadata = Metadata::new();
/// metadata.insert("task", "summarize");
/// metadata.insert("owner", "alice");
/// metadata.insert("task", "translate");
///
/// assert_eq!(metadata.get("task"), Some("translate"));
/// assert_eq!(metadata.keys().collect::<Vec<_>>(), vec!["task", "owner"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Metadata {
    entries: IndexMap<String, String>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, keeping the key's original position if present.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> Iter<'_, String, String> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Metadata {
    type Item = (&'a String, &'a String);
    type IntoIter = Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Metadata {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut metadata = Metadata::new();
        for (key, value) in iter {
            metadata.insert(key, value);
        }
        metadata
    }
}

/// One `key: value` line per entry, in order.
impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.entries {
            writeln!(f, "{key}: {value}")?;
        }
        Ok(())
    }
}
