use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::config::TaxonomyConfig;
use crate::error::{TaxonomyError, TaxonomyResult};
use crate::store::{BTreeStore, TermStore};
use crate::taxonomy::Taxonomy;

/// JSON image of one taxonomy
///
/// ```json
/// {
///     "name": "taxonomy.food",
///     "title": "Food",
///     "default_language": "en",
///     "terms": {
///         "en": {
///             "/Fruits": { "identifier": 1, "parent": null },
///             "/Fruits/Apples": { "identifier": 2, "parent": 1 }
///         }
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomySnapshot {
    pub name: String,
    pub title: String,
    pub default_language: String,
    pub terms: BTreeStore,
}

impl TaxonomySnapshot {
    pub fn from_taxonomy<S: TermStore>(taxonomy: &Taxonomy<S>) -> Self {
        let tree = taxonomy.tree();
        let mut terms = BTreeStore::new();
        for language in tree.languages() {
            for (path, entry) in tree.entries(&language) {
                terms.insert(&language, path, entry);
            }
        }
        TaxonomySnapshot {
            name: taxonomy.name().to_string(),
            title: taxonomy.title().to_string(),
            default_language: taxonomy.default_language().to_string(),
            terms,
        }
    }

    pub fn into_taxonomy(self, config: &TaxonomyConfig) -> Taxonomy {
        let mut taxonomy =
            Taxonomy::with_store(&self.name, &self.title, &self.default_language, self.terms);
        taxonomy.with_config(config.clone());
        taxonomy
    }
}

/// Write a taxonomy to a JSON snapshot file
///
/// # Errors
/// - File write errors
pub fn save_taxonomy_to_file<S: TermStore>(path: &Path, taxonomy: &Taxonomy<S>) -> TaxonomyResult<()> {
    let snapshot = TaxonomySnapshot::from_taxonomy(taxonomy);
    let content = serde_json::to_string_pretty(&snapshot)?;
    fs::write(path, content).map_err(|e| TaxonomyError::io(path, e))
}

/// Load a taxonomy from a JSON snapshot file
///
/// # Errors
/// - File not found / read errors
/// - Invalid JSON or a document not shaped like [`TaxonomySnapshot`]
pub fn load_taxonomy_from_file(path: &Path, config: &TaxonomyConfig) -> TaxonomyResult<Taxonomy> {
    let content = fs::read_to_string(path).map_err(|e| TaxonomyError::io(path, e))?;
    let snapshot: TaxonomySnapshot = serde_json::from_str(&content)?;
    Ok(snapshot.into_taxonomy(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TermEntry;

    fn food() -> Taxonomy {
        let mut taxonomy = Taxonomy::new("taxonomy.food", "Food", "en");
        taxonomy.add("en", 1, "/Fruits", None);
        taxonomy.add("en", 2, "/Fruits/Apples", Some(1));
        taxonomy.add("fr", 2, "/Fruits/Pommes", Some(1));
        taxonomy
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("food.json");

        save_taxonomy_to_file(&path, &food()).unwrap();
        let loaded = load_taxonomy_from_file(&path, &TaxonomyConfig::default()).unwrap();

        assert_eq!(loaded.name(), "taxonomy.food");
        assert_eq!(loaded.title(), "Food");
        assert_eq!(loaded.default_language(), "en");
        assert_eq!(
            loaded.tree().get("fr", "/Fruits/Pommes"),
            Some(TermEntry::new(2, Some(1)))
        );
        assert_eq!(loaded.translate(2, "en"), "Fruits » Apples");
    }

    #[test]
    fn test_snapshot_shape() {
        let snapshot = TaxonomySnapshot::from_taxonomy(&food());
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["terms"]["en"]["/Fruits"]["parent"], serde_json::Value::Null);
        assert_eq!(json["terms"]["en"]["/Fruits/Apples"]["parent"], 1);
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let result = load_taxonomy_from_file(&path, &TaxonomyConfig::default());
        assert!(matches!(result, Err(TaxonomyError::Json(_))));
    }
}
