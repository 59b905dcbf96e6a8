//! Per-language path tree with a memoized reverse index
//!
//! The [`PathTree`] owns the stored terms (`language -> path -> entry`) and a
//! modification version. The [`ReverseIndex`] (`language -> identifier -> path`)
//! is derived from the store and cached against that version, so a lookup after
//! any `add` or `clear` always sees a rebuilt index.

use std::cell::{Ref, RefCell};
use std::collections::HashMap;

use crate::store::{BTreeStore, TermEntry, TermId, TermStore};

/// Separator between the segments of a path
pub const PATH_SEPARATOR: char = '/';

/// Derived `language -> (identifier -> path)` mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReverseIndex(HashMap<String, HashMap<TermId, String>>);

impl ReverseIndex {
    /// Build the reverse index of a store.
    ///
    /// If one language maps several paths to the same identifier, the path that
    /// iterates last (the greatest one) wins.
    pub fn build<S: TermStore>(store: &S) -> Self {
        let mut index = HashMap::new();
        for language in store.languages() {
            let inverted: HashMap<TermId, String> = store
                .entries(&language)
                .into_iter()
                .map(|(path, entry)| (entry.identifier, path))
                .collect();
            index.insert(language, inverted);
        }
        ReverseIndex(index)
    }

    pub fn path(&self, language: &str, identifier: TermId) -> Option<&str> {
        self.0
            .get(language)
            .and_then(|paths| paths.get(&identifier))
            .map(String::as_str)
    }

    pub fn language(&self, language: &str) -> Option<&HashMap<TermId, String>> {
        self.0.get(language)
    }

    pub fn contains_language(&self, language: &str) -> bool {
        self.0.contains_key(language)
    }
}

#[derive(Debug, Clone, Default)]
struct CachedReverseIndex {
    version: Option<u64>,
    index: ReverseIndex,
}

/// Multi-language path tree over a [`TermStore`]
#[derive(Debug, Clone)]
pub struct PathTree<S = BTreeStore> {
    store: S,
    version: u64,
    reverse: RefCell<CachedReverseIndex>,
}

impl PathTree<BTreeStore> {
    pub fn new() -> Self {
        PathTree::with_store(BTreeStore::new())
    }
}

impl Default for PathTree<BTreeStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TermStore> PathTree<S> {
    pub fn with_store(store: S) -> Self {
        PathTree {
            store,
            version: 0,
            reverse: RefCell::new(CachedReverseIndex::default()),
        }
    }

    /// Insert or overwrite the term stored under `(language, path)`.
    ///
    /// Re-adding an existing path with another identifier overwrites it: last
    /// write wins.
    pub fn add(&mut self, language: &str, identifier: TermId, path: &str, parent: Option<TermId>) {
        self.store
            .insert(language, path.to_string(), TermEntry::new(identifier, parent));
        self.version += 1;
    }

    /// Remove every term of every language
    pub fn clear(&mut self) {
        self.store.clear();
        self.version += 1;
    }

    pub fn get(&self, language: &str, path: &str) -> Option<TermEntry> {
        self.store.get(language, path)
    }

    pub fn languages(&self) -> Vec<String> {
        self.store.languages()
    }

    pub fn entries(&self, language: &str) -> Vec<(String, TermEntry)> {
        self.store.entries(language)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Modification counter, incremented by every `add` and `clear`
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reverse index for the current version of the tree, rebuilt on demand
    pub fn reverse_index(&self) -> Ref<'_, ReverseIndex> {
        let stale = self.reverse.borrow().version != Some(self.version);
        if stale {
            let mut cache = self.reverse.borrow_mut();
            cache.index = ReverseIndex::build(&self.store);
            cache.version = Some(self.version);
        }
        Ref::map(self.reverse.borrow(), |cache| &cache.index)
    }

    /// Path of `identifier` in `language`, if the term exists there
    pub fn path_of(&self, language: &str, identifier: TermId) -> Option<String> {
        self.reverse_index()
            .path(language, identifier)
            .map(str::to_string)
    }
}
