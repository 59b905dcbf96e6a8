use tracing::{debug, info};

use crate::config::TaxonomyConfig;
use crate::error::TaxonomyResult;
use crate::hierarchy::{build_path_index, make_translation_table};
use crate::language::normalize_language;
use crate::path_tree::{PATH_SEPARATOR, PathTree};
use crate::store::{BTreeStore, TermId, TermStore};
use crate::vdex::{self, ImportedVocabulary};
use crate::vocabulary::{Vocabulary, VocabularyTerm};

/// A named multi-language taxonomy
///
/// Terms are added per language with their full path and parent identifier:
///
/// ```
/// use vdex_taxonomy::Taxonomy;
///
/// let mut taxonomy = Taxonomy::new("taxonomy.food", "Food", "en");
/// taxonomy.add("en", 1, "/Fruits", None);
/// taxonomy.add("en", 2, "/Fruits/Apples", Some(1));
/// taxonomy.add("fr", 2, "/Fruits/Pommes", Some(1));
///
/// assert_eq!(taxonomy.translate(2, "en"), "Fruits » Apples");
/// assert_eq!(taxonomy.translate(2, "fr"), "Fruits » Pommes");
/// assert_eq!(taxonomy.translate(2, "de"), "");
/// ```
#[derive(Debug, Clone)]
pub struct Taxonomy<S = BTreeStore> {
    name: String,
    title: String,
    default_language: String,
    tree: PathTree<S>,
    config: TaxonomyConfig,
}

impl Taxonomy<BTreeStore> {
    pub fn new(name: &str, title: &str, default_language: &str) -> Self {
        Taxonomy::with_store(name, title, default_language, BTreeStore::new())
    }
}

impl<S: TermStore> Taxonomy<S> {
    /// Create a taxonomy over an existing store
    pub fn with_store(name: &str, title: &str, default_language: &str, store: S) -> Self {
        Taxonomy {
            name: name.to_string(),
            title: title.to_string(),
            default_language: normalize_language(default_language),
            tree: PathTree::with_store(store),
            config: TaxonomyConfig::default(),
        }
    }

    pub fn with_config(&mut self, config: TaxonomyConfig) -> &mut Self {
        self.config = config;
        self
    }

    pub fn with_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    pub fn config(&self) -> &TaxonomyConfig {
        &self.config
    }

    pub fn tree(&self) -> &PathTree<S> {
        &self.tree
    }

    /// Last dotted segment of the name: `taxonomy.food` -> `food`
    pub fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Namespaced name: `taxonomy.food`, `taxonomy.site.food`
    pub fn vocabulary_name(&self) -> String {
        format!("{}{}", self.config.namespace_prefix, self.vocabulary_identifier())
    }

    /// Name of the schema field behavior generated for this taxonomy
    pub fn generated_name(&self) -> String {
        format!("{}generated.{}", self.config.namespace_prefix, self.short_name())
    }

    /// The `vocabIdentifier` of exported documents: the name without its
    /// namespace prefix, dots included
    pub fn vocabulary_identifier(&self) -> String {
        identifier_of(&self.name, &self.config.namespace_prefix).to_string()
    }

    /// Insert or overwrite one term path in one language.
    ///
    /// # Arguments
    /// * `language` - Language tag, normalized before storing
    /// * `identifier` - Term identifier, shared across languages
    /// * `path` - Root-anchored path, e.g. `/Fruits/Apples`
    /// * `parent` - Identifier of the parent term, `None` at the top of the tree
    pub fn add(&mut self, language: &str, identifier: TermId, path: &str, parent: Option<TermId>) {
        let language = normalize_language(language);
        self.tree.add(&language, identifier, path, parent);
    }

    /// Remove every term in every language
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn languages(&self) -> Vec<String> {
        self.tree.languages()
    }

    /// Display path of a term in one language, e.g. `Fruits » Apples`.
    ///
    /// An identifier or language without terms gives an empty string.
    pub fn translate(&self, identifier: TermId, language: &str) -> String {
        let language = normalize_language(language);
        self.tree
            .reverse_index()
            .path(&language, identifier)
            .map(|path| display_path(path, &self.config.display_separator))
            .unwrap_or_default()
    }

    /// The language to show terms in: the requested one if it has terms, else
    /// the default language, else the first stored language.
    pub fn current_language(&self, requested: Option<&str>) -> Option<String> {
        let languages = self.tree.languages();
        if let Some(requested) = requested.map(normalize_language) {
            if languages.contains(&requested) {
                return Some(requested);
            }
        }
        if languages.contains(&self.default_language) {
            return Some(self.default_language.clone());
        }
        languages.into_iter().next()
    }

    /// Like [`Taxonomy::translate`], with the language resolved by
    /// [`Taxonomy::current_language`] first.
    pub fn translate_with_fallback(&self, identifier: TermId, requested: Option<&str>) -> String {
        match self.current_language(requested) {
            Some(language) => {
                if requested.map(normalize_language).as_deref() != Some(language.as_str()) {
                    debug!(
                        "Taxonomy '{}': translating term {} in '{}' (requested: {:?})",
                        self.name, identifier, language, requested
                    );
                }
                self.translate(identifier, &language)
            }
            None => String::new(),
        }
    }

    /// Add every term of a VDEX document.
    ///
    /// The document is parsed completely before the tree is touched, so a failed
    /// import leaves the taxonomy unchanged. Existing terms are kept; call
    /// [`Taxonomy::clear`] first to replace them.
    ///
    /// # Returns
    /// The number of `(language, path)` entries added
    pub fn import_document(&mut self, xml: &[u8]) -> TaxonomyResult<usize> {
        let vocabulary = vdex::parse(xml)?;
        Ok(self.apply(&vocabulary))
    }

    /// Add every term of an already parsed document
    pub fn apply(&mut self, vocabulary: &ImportedVocabulary) -> usize {
        for (language, path, entry) in vocabulary.entries() {
            self.tree.add(language, entry.identifier, path, entry.parent);
        }
        info!(
            "Imported {} entries into taxonomy '{}'",
            vocabulary.len(),
            self.name
        );
        vocabulary.len()
    }

    /// Serialize the taxonomy as a VDEX document.
    ///
    /// # Errors
    /// `TaxonomyError::Structural` if no term sits at the top of the tree
    pub fn export_document(&self) -> TaxonomyResult<String> {
        let index = build_path_index(&self.tree)?;
        let table = make_translation_table(&self.tree);
        let xml = vdex::serialize(
            &self.title,
            &self.vocabulary_identifier(),
            &index,
            &table,
            &self.config.writer_options(),
        )?;
        debug!(
            "Exported taxonomy '{}': {} terms",
            self.name,
            index.identifiers().len()
        );
        Ok(xml)
    }

    /// All terms of one language, sorted by path
    pub fn vocabulary(&self, requested: Option<&str>) -> Vocabulary {
        let language = self.current_language(requested);
        let terms = match &language {
            Some(language) => self
                .tree
                .entries(language)
                .into_iter()
                .map(|(path, entry)| VocabularyTerm {
                    identifier: entry.identifier,
                    title: display_path(&path, &self.config.display_separator),
                    path,
                })
                .collect(),
            None => Vec::new(),
        };
        Vocabulary::new(&self.vocabulary_name(), language, terms)
    }
}

/// Text following the namespace prefix in a taxonomy name.
///
/// `taxonomy.site.food` -> `site.food`, `collective.taxonomy.food` -> `food`;
/// a name without the prefix is returned unchanged.
pub fn identifier_of<'a>(name: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return name;
    }
    if let Some(identifier) = name.strip_prefix(prefix) {
        return identifier;
    }
    match name.find(prefix) {
        Some(position) => &name[position + prefix.len()..],
        None => name,
    }
}

/// Human readable form of a path: `/Fruits/Apples` -> `Fruits » Apples`
pub fn display_path(path: &str, separator: &str) -> String {
    let path = path.strip_prefix(PATH_SEPARATOR).unwrap_or(path);
    path.replace(PATH_SEPARATOR, separator)
}
