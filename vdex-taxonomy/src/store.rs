//! Ordered term storage
//!
//! A taxonomy keeps its terms as `language -> (path -> TermEntry)`. The [`TermStore`]
//! trait is the seam towards whatever persists that mapping; the core only needs an
//! ordered associative container. [`BTreeStore`] is the in-memory implementation and
//! the shape written to JSON snapshots.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of a term, stable across languages
pub type TermId = i64;

/// The value stored under one `(language, path)` key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TermEntry {
    pub identifier: TermId,
    /// Identifier of the parent term, `None` for terms at the top of the tree
    pub parent: Option<TermId>,
}

impl TermEntry {
    pub fn new(identifier: TermId, parent: Option<TermId>) -> Self {
        Self { identifier, parent }
    }

    pub fn is_root_level(&self) -> bool {
        self.parent.is_none()
    }
}

/// Ordered key-value storage for taxonomy terms.
///
/// Implementations must iterate languages and paths in ascending order; the
/// VDEX writer and the reverse index rely on it for deterministic output.
pub trait TermStore {
    /// Insert or overwrite the entry stored under `(language, path)`,
    /// returning the previous entry if there was one.
    fn insert(&mut self, language: &str, path: String, entry: TermEntry) -> Option<TermEntry>;

    fn get(&self, language: &str, path: &str) -> Option<TermEntry>;

    /// All languages with at least one entry, ascending
    fn languages(&self) -> Vec<String>;

    /// All `(path, entry)` pairs of one language, ascending by path
    fn entries(&self, language: &str) -> Vec<(String, TermEntry)>;

    fn clear(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory [`TermStore`] backed by nested `BTreeMap`s
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BTreeStore(pub BTreeMap<String, BTreeMap<String, TermEntry>>);

impl BTreeStore {
    pub fn new() -> Self {
        BTreeStore(BTreeMap::new())
    }
}

impl TermStore for BTreeStore {
    fn insert(&mut self, language: &str, path: String, entry: TermEntry) -> Option<TermEntry> {
        self.0
            .entry(language.to_string())
            .or_default()
            .insert(path, entry)
    }

    fn get(&self, language: &str, path: &str) -> Option<TermEntry> {
        self.0.get(language).and_then(|paths| paths.get(path)).copied()
    }

    fn languages(&self) -> Vec<String> {
        self.0
            .iter()
            .filter(|(_, paths)| !paths.is_empty())
            .map(|(language, _)| language.clone())
            .collect()
    }

    fn entries(&self, language: &str) -> Vec<(String, TermEntry)> {
        self.0
            .get(language)
            .map(|paths| {
                paths
                    .iter()
                    .map(|(path, entry)| (path.clone(), *entry))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn clear(&mut self) {
        self.0.clear();
    }

    fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut store = BTreeStore::new();
        assert!(store.is_empty());

        let previous = store.insert("en", "/Fruits".to_string(), TermEntry::new(2, Some(1)));
        assert_eq!(previous, None);
        assert_eq!(store.get("en", "/Fruits"), Some(TermEntry::new(2, Some(1))));
        assert_eq!(store.get("fr", "/Fruits"), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_insert_overwrites() {
        let mut store = BTreeStore::new();
        store.insert("en", "/Fruits".to_string(), TermEntry::new(2, None));
        let previous = store.insert("en", "/Fruits".to_string(), TermEntry::new(7, None));

        assert_eq!(previous, Some(TermEntry::new(2, None)));
        assert_eq!(store.get("en", "/Fruits").map(|e| e.identifier), Some(7));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_sorted_iteration() {
        let mut store = BTreeStore::new();
        store.insert("fr", "/b".to_string(), TermEntry::new(2, None));
        store.insert("en", "/c".to_string(), TermEntry::new(3, None));
        store.insert("en", "/a".to_string(), TermEntry::new(1, None));

        assert_eq!(store.languages(), vec!["en", "fr"]);
        let paths: Vec<String> = store.entries("en").into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["/a", "/c"]);
        assert!(store.entries("de").is_empty());
    }

    #[test]
    fn test_clear() {
        let mut store = BTreeStore::new();
        store.insert("en", "/a".to_string(), TermEntry::new(1, None));
        store.insert("de", "/a".to_string(), TermEntry::new(1, None));
        store.clear();

        assert!(store.is_empty());
        assert!(store.languages().is_empty());
    }
}
