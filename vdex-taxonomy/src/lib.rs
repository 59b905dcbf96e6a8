//! Multi-language hierarchical vocabularies ("taxonomies") with VDEX XML
//! import and export.
//!
//! A taxonomy is a tree of terms. Every term has an identifier shared by all
//! languages and, per language, a root-anchored path built from its captions:
//!
//! ```text
//! en  /Food/Fruits/Apples    -> term 3, parent 2
//! fr  /Nourriture/Fruits/Pommes -> term 3, parent 2
//! ```
//!
//! - [`PathTree`] keeps `language -> path -> term` and a memoized reverse index
//!   `language -> term -> path`.
//! - [`hierarchy`] rebuilds the language independent tree shape from the parent
//!   identifiers.
//! - [`vdex`] reads and writes the VDEX subset used for interchange.
//! - [`Taxonomy`] ties them together; [`TaxonomyRegistry`] holds the named
//!   taxonomies of a site and moves them in and out as files.
//!
//! # Example
//!
//! ```
//! use vdex_taxonomy::Taxonomy;
//!
//! let mut taxonomy = Taxonomy::new("taxonomy.food", "Food", "en");
//! taxonomy.add("en", 1, "/Fruits", None);
//! taxonomy.add("en", 2, "/Fruits/Apples", Some(1));
//!
//! let xml = taxonomy.export_document().unwrap();
//!
//! let mut copy = Taxonomy::new("taxonomy.food", "Food", "en");
//! copy.import_document(xml.as_bytes()).unwrap();
//! assert_eq!(copy.translate(2, "en"), "Fruits » Apples");
//! ```

pub mod config;
pub mod error;
pub mod hierarchy;
pub mod language;
pub mod path_tree;
pub mod registry;
pub mod schema;
pub mod snapshot;
pub mod store;
pub mod taxonomy;
pub mod vdex;
pub mod vocabulary;

// Re-export the main types for convenient access
pub use config::TaxonomyConfig;
pub use error::{TaxonomyError, TaxonomyResult};
pub use hierarchy::{HierarchyIndex, TranslationTable, build_path_index, make_translation_table};
pub use path_tree::{PATH_SEPARATOR, PathTree, ReverseIndex};
pub use registry::TaxonomyRegistry;
pub use schema::{FieldDescriptor, FieldKind, FieldOptions};
pub use snapshot::{TaxonomySnapshot, load_taxonomy_from_file, save_taxonomy_to_file};
pub use store::{BTreeStore, TermEntry, TermId, TermStore};
pub use taxonomy::{Taxonomy, display_path};
pub use vdex::ImportedVocabulary;
pub use vocabulary::{Vocabulary, VocabularyTerm};
