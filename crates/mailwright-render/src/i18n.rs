//! Explicit localization lookup for mail rendering.
//!
//! The rendering language is threaded through every render call as a
//! [`Language`] value rather than read from shared process state, so
//! concurrent renders with different languages cannot interfere.
//! Translations live in a read-only [`Catalog`] built before rendering
//! starts.

use std::collections::HashMap;
use std::fmt;

/// A language tag selecting translations during rendering.
///
/// Tags are opaque to the renderer; `"en"`, `"de"`, or full BCP 47
/// tags all work as long as catalog and components agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Language(String);

impl Language {
    /// Creates a language from its tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The raw tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Picks the first translation whose tag matches this language,
    /// falling back to `default`.
    ///
    /// ```
    /// use mailwright_render::Language;
    ///
    /// let de = Language::new("de");
    /// assert_eq!(de.pick("Hello", &[("de", "Hallo")]), "Hallo");
    /// assert_eq!(Language::new("en").pick("Hello", &[("de", "Hallo")]), "Hello");
    /// ```
    #[must_use]
    pub fn pick<'a>(&self, default: &'a str, translations: &[(&str, &'a str)]) -> &'a str {
        translations
            .iter()
            .find(|(tag, _)| *tag == self.0)
            .map_or(default, |(_, translation)| *translation)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Language {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// Read-only translation table keyed by message key and language.
///
/// Lookups fall back to the catalog's default language, then to the
/// key itself, so a missing translation renders as its key instead of
/// failing the whole mail.
#[derive(Debug, Clone)]
pub struct Catalog {
    default_language: Language,
    entries: HashMap<String, HashMap<Language, String>>,
}

impl Catalog {
    /// Creates an empty catalog with the given fallback language.
    #[must_use]
    pub fn new(default_language: Language) -> Self {
        Self {
            default_language,
            entries: HashMap::new(),
        }
    }

    /// Registers a translation for a key and language.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        language: Language,
        translation: impl Into<String>,
    ) {
        self.entries
            .entry(key.into())
            .or_default()
            .insert(language, translation.into());
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(
        mut self,
        key: impl Into<String>,
        language: Language,
        translation: impl Into<String>,
    ) -> Self {
        self.insert(key, language, translation);
        self
    }

    /// Looks up the translation for `key` in `language`.
    #[must_use]
    pub fn translate<'a>(&'a self, key: &'a str, language: &Language) -> &'a str {
        self.entries
            .get(key)
            .and_then(|by_language| {
                by_language
                    .get(language)
                    .or_else(|| by_language.get(&self.default_language))
            })
            .map_or(key, String::as_str)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::new(Language::new("en"))
            .with("greeting", Language::new("en"), "Hello")
            .with("greeting", Language::new("de"), "Hallo")
            .with("farewell", Language::new("en"), "Goodbye")
    }

    #[test]
    fn test_translate_exact_language() {
        let catalog = catalog();
        assert_eq!(catalog.translate("greeting", &Language::new("de")), "Hallo");
    }

    #[test]
    fn test_translate_falls_back_to_default_language() {
        let catalog = catalog();
        assert_eq!(
            catalog.translate("farewell", &Language::new("de")),
            "Goodbye"
        );
    }

    #[test]
    fn test_translate_unknown_key_returns_key() {
        let catalog = catalog();
        assert_eq!(catalog.translate("missing", &Language::new("en")), "missing");
    }

    #[test]
    fn test_pick_matches_tag() {
        let language = Language::new("de");
        assert_eq!(language.pick("Welcome", &[("de", "Willkommen")]), "Willkommen");
    }

    #[test]
    fn test_pick_falls_back_to_default() {
        let language = Language::new("fr");
        assert_eq!(language.pick("Welcome", &[("de", "Willkommen")]), "Welcome");
    }
}
