//! Multilingual text.
//!
//! Every customer-visible string (item labels, descriptions, opening hours, promotions) is a
//! [`LocalizedText`]: a map from language tag to translation. Readers pick one translation with
//! [`LocalizedText::resolve`], which never fails.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Language tag to text, serialized as a plain JSON object (`{"en": "Soup", "fr": "Soupe"}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedText(BTreeMap<String, String>);

impl LocalizedText {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text with a single translation.
    pub fn single(lang: &str, text: impl Into<String>) -> Self {
        Self::new().with(lang, text)
    }

    /// Adds or replaces one translation.
    pub fn with(mut self, lang: &str, text: impl Into<String>) -> Self {
        self.0.insert(lang.to_string(), text.into());
        self
    }

    pub fn get(&self, lang: &str) -> Option<&str> {
        self.0.get(lang).map(String::as_str)
    }

    /// The requested language, then `fallback`, then the first non-empty translation.
    /// Empty when nothing is translated.
    pub fn resolve(&self, lang: &str, fallback: &str) -> &str {
        [lang, fallback]
            .into_iter()
            .filter_map(|l| self.0.get(l))
            .find(|t| !t.trim().is_empty())
            .or_else(|| self.0.values().find(|t| !t.trim().is_empty()))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// True when no translation has visible text.
    pub fn is_blank(&self) -> bool {
        self.0.values().all(|t| t.trim().is_empty())
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Rewrites every key to its canonical tag. Returns the first invalid key on failure.
    pub fn normalized(self) -> Result<Self, String> {
        let mut out = BTreeMap::new();
        for (lang, text) in self.0 {
            let tag = normalize_language_tag(&lang).ok_or(lang)?;
            out.insert(tag, text);
        }
        Ok(Self(out))
    }
}

/// Canonical form of a language tag: `xx`, `xxx` or `xx-YY`.
///
/// Accepts either case and `_` as separator, so `PT_br` becomes `pt-BR`. Returns `None` for
/// anything else.
pub fn normalize_language_tag(tag: &str) -> Option<String> {
    let tag = tag.trim();
    let mut parts = tag.split(['-', '_']);
    let primary = parts.next()?;
    let region = parts.next();
    if parts.next().is_some() {
        return None;
    }

    if !(2..=3).contains(&primary.len()) || !primary.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let mut canonical = primary.to_ascii_lowercase();

    if let Some(region) = region {
        if region.len() != 2 || !region.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        canonical.push('-');
        canonical.push_str(&region.to_ascii_uppercase());
    }
    Some(canonical)
}
