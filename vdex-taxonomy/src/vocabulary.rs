//! Per-language listing of a taxonomy's terms
//!
//! A [`Vocabulary`] is what a selection widget or an indexer consumes: every term
//! of one language with its identifier, stored path and display title.

use serde::Serialize;

use crate::store::TermId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VocabularyTerm {
    pub identifier: TermId,
    /// Stored path, e.g. `/Fruits/Apples`
    pub path: String,
    /// Display form of the path, e.g. `Fruits » Apples`
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vocabulary {
    name: String,
    language: Option<String>,
    terms: Vec<VocabularyTerm>,
}

impl Vocabulary {
    pub fn new(name: &str, language: Option<String>, terms: Vec<VocabularyTerm>) -> Self {
        Vocabulary {
            name: name.to_string(),
            language,
            terms,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Language of the terms, `None` when the taxonomy is empty
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn terms(&self) -> &[VocabularyTerm] {
        &self.terms
    }

    pub fn iter(&self) -> impl Iterator<Item = &VocabularyTerm> {
        self.terms.iter()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn get(&self, identifier: TermId) -> Option<&VocabularyTerm> {
        self.terms.iter().find(|term| term.identifier == identifier)
    }

    pub fn get_by_path(&self, path: &str) -> Option<&VocabularyTerm> {
        self.terms.iter().find(|term| term.path == path)
    }
}
