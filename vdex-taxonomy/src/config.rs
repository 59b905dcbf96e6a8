use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{TaxonomyError, TaxonomyResult};
use crate::language::normalize_language;
use crate::vdex::WriterOptions;

/// Settings shared by the taxonomies of one registry
///
/// Can be loaded from a JSON file; missing keys keep their defaults:
/// ```json
/// {
///     "namespace_prefix": "taxonomy.",
///     "encoding": "utf-8",
///     "display_separator": " » ",
///     "indent": 2,
///     "default_language": "en"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomyConfig {
    /// Prefix of vocabulary names, stripped when writing `vocabIdentifier`
    pub namespace_prefix: String,
    /// Encoding named in the XML declaration of exported documents
    pub encoding: String,
    /// Replaces the path separator in translated display paths
    pub display_separator: String,
    /// Indentation width of exported documents
    pub indent: usize,
    /// Default language of taxonomies created by an import
    pub default_language: String,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        TaxonomyConfig {
            namespace_prefix: "taxonomy.".to_string(),
            encoding: "utf-8".to_string(),
            display_separator: " » ".to_string(),
            indent: 2,
            default_language: "en".to_string(),
        }
    }
}

impl TaxonomyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a JSON file
    ///
    /// # Errors
    /// - File read errors
    /// - Invalid JSON
    pub fn from_file(path: &Path) -> TaxonomyResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| TaxonomyError::io(path, e))?;
        let mut config: TaxonomyConfig = serde_json::from_str(&content)?;
        config.default_language = normalize_language(&config.default_language);
        Ok(config)
    }

    pub fn with_namespace_prefix(&mut self, prefix: &str) -> &mut Self {
        self.namespace_prefix = prefix.to_string();
        self
    }

    pub fn with_encoding(&mut self, encoding: &str) -> &mut Self {
        self.encoding = encoding.to_string();
        self
    }

    pub fn with_display_separator(&mut self, separator: &str) -> &mut Self {
        self.display_separator = separator.to_string();
        self
    }

    pub fn with_indent(&mut self, indent: usize) -> &mut Self {
        self.indent = indent;
        self
    }

    pub fn with_default_language(&mut self, language: &str) -> &mut Self {
        self.default_language = normalize_language(language);
        self
    }

    pub fn writer_options(&self) -> WriterOptions {
        WriterOptions {
            encoding: self.encoding.clone(),
            indent: self.indent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = TaxonomyConfig::new();
        assert_eq!(config.namespace_prefix, "taxonomy.");
        assert_eq!(config.display_separator, " » ");
        assert_eq!(config.writer_options(), WriterOptions::default());
    }

    #[test]
    fn test_builder() {
        let mut config = TaxonomyConfig::new();
        config
            .with_namespace_prefix("collective.taxonomy.")
            .with_encoding("latin-1")
            .with_indent(4)
            .with_default_language("DE");

        assert_eq!(config.namespace_prefix, "collective.taxonomy.");
        assert_eq!(config.default_language, "de");
        assert_eq!(config.writer_options().indent, 4);
        assert_eq!(config.writer_options().encoding, "latin-1");
    }

    #[test]
    fn test_from_file_keeps_missing_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"display_separator": " > ", "default_language": "FR"}}"#).unwrap();

        let config = TaxonomyConfig::from_file(file.path()).unwrap();
        assert_eq!(config.display_separator, " > ");
        assert_eq!(config.default_language, "fr");
        assert_eq!(config.indent, 2);
    }

    #[test]
    fn test_from_missing_file() {
        let result = TaxonomyConfig::from_file(Path::new("/nonexistent/taxonomy.json"));
        assert!(matches!(result, Err(TaxonomyError::Io { .. })));
    }
}
