//! Hierarchy reconstruction from flat `(identifier, parent)` pairs
//!
//! Paths only describe the tree of one language. The language independent shape
//! of the taxonomy is recovered from the parent identifiers stored alongside each
//! path, harvested across every language:
//!
//! ```text
//! en: /Food -> (1, None)    /Food/Fruits -> (2, Some(1))
//! fr: /Nourriture -> (1, None)
//!
//! adjacency: None -> {1}, Some(1) -> {2}
//! index:     {1: {2: {}}}
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::warn;

use crate::error::{TaxonomyError, TaxonomyResult};
use crate::path_tree::{PATH_SEPARATOR, PathTree};
use crate::store::{TermId, TermStore};

/// Nested `identifier -> {child -> {...}}` structure, children ascending.
/// A leaf maps to an empty index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HierarchyIndex(BTreeMap<TermId, HierarchyIndex>);

impl HierarchyIndex {
    pub fn new() -> Self {
        HierarchyIndex(BTreeMap::new())
    }

    /// Add `identifier` with the given subtree, replacing an existing one
    pub fn insert(&mut self, identifier: TermId, children: HierarchyIndex) -> &mut Self {
        self.0.insert(identifier, children);
        self
    }

    pub fn get(&self, identifier: TermId) -> Option<&HierarchyIndex> {
        self.0.get(&identifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, &HierarchyIndex)> {
        self.0.iter().map(|(id, children)| (*id, children))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Every identifier in the index, at any depth
    pub fn identifiers(&self) -> BTreeSet<TermId> {
        let mut ids = BTreeSet::new();
        self.collect_identifiers(&mut ids);
        ids
    }

    fn collect_identifiers(&self, ids: &mut BTreeSet<TermId>) {
        for (id, children) in &self.0 {
            ids.insert(*id);
            children.collect_identifiers(ids);
        }
    }
}

/// Per identifier, the leaf label of every language it appears in
pub type TranslationTable = BTreeMap<TermId, BTreeMap<String, String>>;

/// The final segment of a path: `/Food/Fruits` -> `Fruits`
pub fn last_segment(path: &str) -> &str {
    match path.rfind(PATH_SEPARATOR) {
        Some(position) => &path[position + PATH_SEPARATOR.len_utf8()..],
        None => path,
    }
}

/// Build the nested hierarchy index of a path tree.
///
/// # Errors
/// - `TaxonomyError::Structural` if no term sits at the top of the tree
/// - `TaxonomyError::Structural` if parent links form a cycle below the top level
pub fn build_path_index<S: TermStore>(tree: &PathTree<S>) -> TaxonomyResult<HierarchyIndex> {
    let mut adjacency: HashMap<Option<TermId>, BTreeSet<TermId>> = HashMap::new();
    for language in tree.languages() {
        for (_, entry) in tree.entries(&language) {
            adjacency
                .entry(entry.parent)
                .or_default()
                .insert(entry.identifier);
        }
    }

    let roots = adjacency
        .get(&None)
        .ok_or_else(|| TaxonomyError::Structural("No root node".to_string()))?;

    let mut ancestors = HashSet::new();
    let index = expand(roots, &adjacency, &mut ancestors)?;

    let reached = index.identifiers();
    let unreachable = adjacency
        .values()
        .flatten()
        .filter(|id| !reached.contains(*id))
        .collect::<BTreeSet<_>>();
    if !unreachable.is_empty() {
        warn!(
            "Dropping {} term(s) not connected to the root: {:?}",
            unreachable.len(),
            unreachable
        );
    }

    Ok(index)
}

fn expand(
    identifiers: &BTreeSet<TermId>,
    adjacency: &HashMap<Option<TermId>, BTreeSet<TermId>>,
    ancestors: &mut HashSet<TermId>,
) -> TaxonomyResult<HierarchyIndex> {
    let mut index = HierarchyIndex::new();
    for &identifier in identifiers {
        if !ancestors.insert(identifier) {
            return Err(TaxonomyError::Structural(format!(
                "Parent cycle through term {}",
                identifier
            )));
        }
        let children = match adjacency.get(&Some(identifier)) {
            Some(children) => expand(children, adjacency, ancestors)?,
            None => HierarchyIndex::new(),
        };
        ancestors.remove(&identifier);
        index.insert(identifier, children);
    }
    Ok(index)
}

/// Collect the leaf label of every term in every language.
pub fn make_translation_table<S: TermStore>(tree: &PathTree<S>) -> TranslationTable {
    let mut table = TranslationTable::new();
    for language in tree.languages() {
        for (path, entry) in tree.entries(&language) {
            table
                .entry(entry.identifier)
                .or_default()
                .insert(language.clone(), last_segment(&path).to_string());
        }
    }
    table
}
