//! Named taxonomies and bundle import/export
//!
//! The registry is the entry point for collaborators: it owns every taxonomy of a
//! site under its vocabulary name and moves them in and out as VDEX documents.
//! A bundle is a directory holding one `<vocabulary-identifier>.xml` file per
//! taxonomy.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::TaxonomyConfig;
use crate::error::{TaxonomyError, TaxonomyResult};
use crate::taxonomy::{Taxonomy, identifier_of};
use crate::vdex::{self, ImportedVocabulary};

/// File extension of taxonomy files in a bundle
pub const BUNDLE_EXTENSION: &str = "xml";

#[derive(Debug, Clone, Default)]
pub struct TaxonomyRegistry {
    // Keyed by vocabulary name, e.g. "taxonomy.food"
    taxonomies: BTreeMap<String, Taxonomy>,
    config: TaxonomyConfig,
}

impl TaxonomyRegistry {
    pub fn new(config: TaxonomyConfig) -> Self {
        TaxonomyRegistry {
            taxonomies: BTreeMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &TaxonomyConfig {
        &self.config
    }

    /// Vocabulary name for a taxonomy name or a bare vocabulary identifier:
    /// `food` and `taxonomy.food` both give `taxonomy.food`, `site.food` gives
    /// `taxonomy.site.food`.
    pub fn vocabulary_name(&self, name: &str) -> String {
        let prefix = &self.config.namespace_prefix;
        format!("{}{}", prefix, identifier_of(name, prefix))
    }

    /// Register a new taxonomy, or return the one already registered under `name`.
    pub fn register_taxonomy(
        &mut self,
        name: &str,
        title: &str,
        default_language: &str,
    ) -> &mut Taxonomy {
        let key = self.vocabulary_name(name);
        let config = &self.config;
        self.taxonomies.entry(key).or_insert_with(|| {
            info!("Registering taxonomy '{}'", name);
            let mut taxonomy = Taxonomy::new(name, title, default_language);
            taxonomy.with_config(config.clone());
            taxonomy
        })
    }

    /// Register an existing taxonomy, replacing any taxonomy of the same name
    pub fn insert(&mut self, taxonomy: Taxonomy) -> Option<Taxonomy> {
        let key = self.vocabulary_name(taxonomy.name());
        self.taxonomies.insert(key, taxonomy)
    }

    pub fn get(&self, name: &str) -> Option<&Taxonomy> {
        self.taxonomies.get(&self.vocabulary_name(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Taxonomy> {
        let key = self.vocabulary_name(name);
        self.taxonomies.get_mut(&key)
    }

    pub fn unregister(&mut self, name: &str) -> Option<Taxonomy> {
        let key = self.vocabulary_name(name);
        self.taxonomies.remove(&key)
    }

    /// Vocabulary names of all registered taxonomies, ascending
    pub fn names(&self) -> Vec<String> {
        self.taxonomies.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.taxonomies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taxonomies.is_empty()
    }

    /// Import a VDEX document into the taxonomy named by its `vocabIdentifier`,
    /// registering it first if needed.
    ///
    /// # Arguments
    /// * `xml` - The VDEX document
    /// * `purge` - Remove the existing terms of the taxonomy before importing
    ///
    /// # Returns
    /// The vocabulary name of the imported taxonomy
    ///
    /// # Errors
    /// Parse and structural errors of the document, or a missing `vocabIdentifier`.
    /// Nothing is changed when an error is returned.
    pub fn import_document(&mut self, xml: &[u8], purge: bool) -> TaxonomyResult<String> {
        let vocabulary = vdex::parse(xml)?;
        let name = self.resolve_name(&vocabulary)?;
        self.apply(&name, &vocabulary, purge);
        Ok(name)
    }

    /// Vocabulary name a document imports into: the namespace prefix followed
    /// by the full `vocabIdentifier`
    fn resolve_name(&self, vocabulary: &ImportedVocabulary) -> TaxonomyResult<String> {
        let identifier = vocabulary
            .identifier
            .as_deref()
            .map(str::trim)
            .filter(|identifier| !identifier.is_empty())
            .ok_or_else(|| {
                TaxonomyError::Structural("Document has no <vocabIdentifier>".to_string())
            })?;
        Ok(format!("{}{}", self.config.namespace_prefix, identifier))
    }

    fn apply(&mut self, name: &str, vocabulary: &ImportedVocabulary, purge: bool) {
        let title = vocabulary
            .title
            .as_deref()
            .unwrap_or_else(|| identifier_of(name, &self.config.namespace_prefix))
            .to_string();
        let default_language = self.config.default_language.clone();

        let taxonomy = self.register_taxonomy(name, &title, &default_language);
        if purge {
            taxonomy.clear();
        }
        taxonomy.apply(vocabulary);
    }

    /// Export one taxonomy as a VDEX document
    ///
    /// # Errors
    /// - `TaxonomyError::UnknownTaxonomy` if no taxonomy is registered under `name`
    /// - `TaxonomyError::Structural` if the taxonomy has no root term
    pub fn export_document(&self, name: &str) -> TaxonomyResult<String> {
        self.get(name)
            .ok_or_else(|| TaxonomyError::UnknownTaxonomy(name.to_string()))?
            .export_document()
    }

    /// Write every taxonomy to `dir` as `<vocabulary-identifier>.xml`.
    ///
    /// Taxonomies without terms are skipped. All documents are serialized before
    /// the first file is written.
    ///
    /// # Returns
    /// The paths of the written files
    pub fn export_bundle(&self, dir: &Path) -> TaxonomyResult<Vec<PathBuf>> {
        let mut documents = Vec::new();
        for taxonomy in self.taxonomies.values() {
            if taxonomy.is_empty() {
                warn!("Skipping empty taxonomy '{}' in bundle export", taxonomy.name());
                continue;
            }
            let file_name = format!(
                "{}.{}",
                taxonomy.vocabulary_identifier(),
                BUNDLE_EXTENSION
            );
            documents.push((dir.join(file_name), taxonomy.export_document()?));
        }

        fs::create_dir_all(dir).map_err(|e| TaxonomyError::io(dir, e))?;
        let mut written = Vec::new();
        for (path, xml) in documents {
            fs::write(&path, xml).map_err(|e| TaxonomyError::io(&path, e))?;
            written.push(path);
        }
        info!(
            "Exported {} taxonomies to {}",
            written.len(),
            dir.display()
        );
        Ok(written)
    }

    /// Import every `*.xml` file of `dir`, in file name order.
    ///
    /// All files are read, parsed and checked for a `vocabIdentifier` before any
    /// taxonomy is changed.
    ///
    /// # Returns
    /// The vocabulary names of the imported taxonomies
    pub fn import_bundle(&mut self, dir: &Path, purge: bool) -> TaxonomyResult<Vec<String>> {
        if !dir.is_dir() {
            return Err(TaxonomyError::io(
                dir,
                std::io::Error::new(std::io::ErrorKind::NotFound, "bundle directory not found"),
            ));
        }

        let entries = fs::read_dir(dir).map_err(|e| TaxonomyError::io(dir, e))?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| TaxonomyError::io(dir, e))?.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some(BUNDLE_EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            warn!("No taxonomy files found in {}", dir.display());
        }

        let mut vocabularies = Vec::with_capacity(paths.len());
        for path in &paths {
            let xml = fs::read(path).map_err(|e| TaxonomyError::io(path, e))?;
            vocabularies.push(vdex::parse(&xml)?);
        }

        let names = vocabularies
            .iter()
            .map(|vocabulary| self.resolve_name(vocabulary))
            .collect::<TaxonomyResult<Vec<_>>>()?;

        for (name, vocabulary) in names.iter().zip(&vocabularies) {
            self.apply(name, vocabulary, purge);
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOOD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<vdex xmlns="http://www.imsglobal.org/xsd/imsvdex_v1p0" language="en">
  <vocabName><langstring language="en">Food</langstring></vocabName>
  <vocabIdentifier>food</vocabIdentifier>
  <term>
    <termIdentifier>1</termIdentifier>
    <caption><langstring language="en">Fruits</langstring></caption>
    <term>
      <termIdentifier>2</termIdentifier>
      <caption><langstring language="en">Apples</langstring></caption>
    </term>
  </term>
</vdex>"#;

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = TaxonomyRegistry::default();
        registry
            .register_taxonomy("food", "Food", "en")
            .add("en", 1, "/Fruits", None);
        let again = registry.register_taxonomy("taxonomy.food", "Other title", "de");

        assert_eq!(again.title(), "Food");
        assert_eq!(again.translate(1, "en"), "Fruits");
        assert_eq!(registry.names(), vec!["taxonomy.food"]);
    }

    #[test]
    fn test_insert_replaces() {
        let mut registry = TaxonomyRegistry::default();
        registry.register_taxonomy("taxonomy.food", "Food", "en");

        let mut loaded = Taxonomy::new("taxonomy.food", "Food and drink", "en");
        loaded.add("en", 1, "/Fruits", None);
        assert!(registry.insert(loaded).is_some());

        let food = registry.get("food").unwrap();
        assert_eq!(food.title(), "Food and drink");
        assert_eq!(food.translate(1, "en"), "Fruits");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_by_short_or_full_name() {
        let mut registry = TaxonomyRegistry::default();
        registry.register_taxonomy("food", "Food", "en");
        assert!(registry.get("food").is_some());
        assert!(registry.get("taxonomy.food").is_some());
        assert!(registry.get("drinks").is_none());

        assert!(registry.unregister("food").is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_import_creates_taxonomy() {
        let mut registry = TaxonomyRegistry::default();
        let name = registry.import_document(FOOD.as_bytes(), false).unwrap();

        assert_eq!(name, "taxonomy.food");
        let taxonomy = registry.get("food").unwrap();
        assert_eq!(taxonomy.title(), "Food");
        assert_eq!(taxonomy.translate(2, "en"), "Fruits » Apples");
    }

    #[test]
    fn test_import_with_and_without_purge() {
        let mut registry = TaxonomyRegistry::default();
        registry
            .register_taxonomy("food", "Food", "en")
            .add("en", 9, "/Old", None);

        registry.import_document(FOOD.as_bytes(), false).unwrap();
        assert_eq!(registry.get("food").unwrap().translate(9, "en"), "Old");

        registry.import_document(FOOD.as_bytes(), true).unwrap();
        let taxonomy = registry.get("food").unwrap();
        assert_eq!(taxonomy.translate(9, "en"), "");
        assert_eq!(taxonomy.translate(1, "en"), "Fruits");
    }

    #[test]
    fn test_import_without_identifier() {
        let mut registry = TaxonomyRegistry::default();
        let xml = FOOD.replace("<vocabIdentifier>food</vocabIdentifier>", "");
        let result = registry.import_document(xml.as_bytes(), false);

        assert!(matches!(result, Err(TaxonomyError::Structural(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_export_unknown_taxonomy() {
        let registry = TaxonomyRegistry::default();
        assert!(matches!(
            registry.export_document("food"),
            Err(TaxonomyError::UnknownTaxonomy(_))
        ));
    }

    #[test]
    fn test_bundle_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = TaxonomyRegistry::default();
        registry.import_document(FOOD.as_bytes(), false).unwrap();
        registry
            .register_taxonomy("drinks", "Drinks", "en")
            .add("en", 1, "/Tea", None);
        registry.register_taxonomy("empty", "Empty", "en");

        let written = registry.export_bundle(dir.path()).unwrap();
        assert_eq!(
            written,
            vec![dir.path().join("drinks.xml"), dir.path().join("food.xml")]
        );

        let mut restored = TaxonomyRegistry::default();
        let names = restored.import_bundle(dir.path(), true).unwrap();
        assert_eq!(names, vec!["taxonomy.drinks", "taxonomy.food"]);
        assert_eq!(restored.get("drinks").unwrap().translate(1, "en"), "Tea");
        assert_eq!(
            restored.get("food").unwrap().translate(2, "en"),
            "Fruits » Apples"
        );
    }

    #[test]
    fn test_bundle_with_broken_file_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.xml"), FOOD).unwrap();
        fs::write(dir.path().join("b.xml"), "<vdex><term>").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut registry = TaxonomyRegistry::default();
        let result = registry.import_bundle(dir.path(), false);
        assert!(matches!(result, Err(TaxonomyError::Parse(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_bundle_without_identifier_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.xml"), FOOD).unwrap();
        let anonymous = FOOD.replace(">food<", "> <");
        fs::write(dir.path().join("b.xml"), anonymous).unwrap();

        let mut registry = TaxonomyRegistry::default();
        registry
            .register_taxonomy("drinks", "Drinks", "en")
            .add("en", 1, "/Tea", None);

        let result = registry.import_bundle(dir.path(), false);
        assert!(matches!(result, Err(TaxonomyError::Structural(_))));
        assert_eq!(registry.names(), vec!["taxonomy.drinks"]);
        assert_eq!(registry.get("drinks").unwrap().tree().len(), 1);
    }

    #[test]
    fn test_dotted_identifiers_stay_apart() {
        let site_a = FOOD.replace(">food<", ">site.a.food<");
        let site_b = FOOD
            .replace(">food<", ">site.b.food<")
            .replace("<termIdentifier>2</termIdentifier>", "<termIdentifier>5</termIdentifier>");

        let mut registry = TaxonomyRegistry::default();
        let a = registry.import_document(site_a.as_bytes(), false).unwrap();
        let b = registry.import_document(site_b.as_bytes(), false).unwrap();

        assert_eq!(a, "taxonomy.site.a.food");
        assert_eq!(b, "taxonomy.site.b.food");
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(&a).unwrap().translate(5, "en"), "");
        assert_eq!(registry.get(&b).unwrap().translate(5, "en"), "Fruits » Apples");

        let exported = registry.export_document(&b).unwrap();
        assert!(exported.contains("<vocabIdentifier>site.b.food</vocabIdentifier>"));
    }

    #[test]
    fn test_dotted_identifiers_in_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = TaxonomyRegistry::default();
        registry
            .import_document(FOOD.replace(">food<", ">site.a.food<").as_bytes(), false)
            .unwrap();
        registry
            .import_document(FOOD.replace(">food<", ">site.b.food<").as_bytes(), false)
            .unwrap();

        let written = registry.export_bundle(dir.path()).unwrap();
        assert_eq!(
            written,
            vec![dir.path().join("site.a.food.xml"), dir.path().join("site.b.food.xml")]
        );

        let mut restored = TaxonomyRegistry::default();
        let names = restored.import_bundle(dir.path(), false).unwrap();
        assert_eq!(names, vec!["taxonomy.site.a.food", "taxonomy.site.b.food"]);
    }

    #[test]
    fn test_import_missing_bundle() {
        let mut registry = TaxonomyRegistry::default();
        let result = registry.import_bundle(Path::new("/nonexistent/bundle"), false);
        assert!(matches!(result, Err(TaxonomyError::Io { .. })));
    }
}
