//! Error types for taxonomy import, export and persistence

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaxonomyError {
    /// The tree or document is well-formed but does not describe a valid taxonomy:
    /// no root term, a `<term>` without `<termIdentifier>`, a parent cycle, ...
    #[error("Structural error: {0}")]
    Structural(String),

    /// The input is not well-formed XML
    #[error("XML parse error: {0}")]
    Parse(String),

    /// Serializing the VDEX document failed
    #[error("XML write error: {0}")]
    Write(String),

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A registry lookup named a taxonomy that was never registered
    #[error("Unknown taxonomy: {0}")]
    UnknownTaxonomy(String),
}

impl TaxonomyError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TaxonomyError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for taxonomy operations
pub type TaxonomyResult<T> = Result<T, TaxonomyError>;
