//! Language tag normalization
//!
//! Captions, stored paths and lookups are keyed by language tag. Tags coming from
//! VDEX documents and from callers are normalized to their canonical BCP-47 form
//! so that `EN`, `en` and ` en ` all address the same language.

use icu_locale::Locale;
use tracing::warn;

/// Normalize a language tag to its canonical BCP-47 spelling.
///
/// Tags that do not parse as a locale are kept, trimmed and lower-cased.
///
/// # Example
///
/// ```
/// use vdex_taxonomy::language::normalize_language;
///
/// assert_eq!(normalize_language("EN"), "en");
/// assert_eq!(normalize_language("pt-br"), "pt-BR");
/// ```
pub fn normalize_language(tag: &str) -> String {
    let trimmed = tag.trim();
    match trimmed.parse::<Locale>() {
        Ok(locale) => locale.to_string(),
        Err(e) => {
            warn!("Keeping unparsable language tag '{}': {}", trimmed, e);
            trimmed.to_lowercase()
        }
    }
}
