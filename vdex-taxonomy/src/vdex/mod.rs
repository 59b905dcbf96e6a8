//! Import and export of the VDEX XML vocabulary format
//!
//! Only the subset needed for hierarchical taxonomies is supported: `vocabName`,
//! `vocabIdentifier` and nested `term` elements carrying a `termIdentifier` and a
//! `caption` with one `langstring` per language.

pub mod reader;
pub mod writer;

pub use reader::{ImportedVocabulary, LanguageTerms, parse};
pub use writer::{IMSVDEX_ATTRIBUTES, IMSVDEX_NAMESPACE, WriterOptions, serialize};
