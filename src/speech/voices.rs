//! Voice catalogs: language code -> available voices

use crate::{Result, TtsError};
use std::collections::BTreeMap;

/// Lowercase with `-` as the region separator (`en_US` -> `en-us`)
pub fn normalize_lang(lang: &str) -> String {
    lang.trim().replace('_', "-").to_lowercase()
}

/// Base language of a region-qualified code (`en-us` -> `en`)
pub fn base_lang(lang: &str) -> &str {
    lang.split('-').next().unwrap_or(lang)
}

/// Voices an engine offers, per language
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceCatalog {
    voices: BTreeMap<String, Vec<String>>,
}

impl VoiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add voices for a language, keeping first-seen order and skipping
    /// duplicates
    pub fn insert<I, S>(&mut self, lang: &str, voices: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.voices.entry(normalize_lang(lang)).or_default();
        for voice in voices {
            let voice = voice.into();
            if !entry.contains(&voice) {
                entry.push(voice);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.voices.keys().map(String::as_str)
    }

    /// Catalog language serving `lang`: the exact code, else its base
    /// language
    pub fn resolve_lang(&self, lang: &str) -> Option<String> {
        let lang = normalize_lang(lang);
        if self.voices.contains_key(&lang) {
            return Some(lang);
        }
        let base = base_lang(&lang);
        if self.voices.contains_key(base) {
            return Some(base.to_string());
        }
        None
    }

    /// Voices for `lang`, with base-language fallback
    pub fn get(&self, lang: &str) -> Option<&[String]> {
        let lang = self.resolve_lang(lang)?;
        self.voices.get(&lang).map(Vec::as_slice)
    }

    /// Check that `voice` is offered for `lang`
    ///
    /// Returns the catalog language the request resolved to. An empty
    /// catalog means the engine can't enumerate voices, and anything is
    /// accepted.
    pub fn validate(&self, lang: &str, voice: &str) -> Result<String> {
        if self.is_empty() {
            return Ok(normalize_lang(lang));
        }
        let resolved = self
            .resolve_lang(lang)
            .ok_or_else(|| TtsError::Config(format!("Unsupported language: {}", lang)))?;
        let voices = self.voices.get(&resolved).map(Vec::as_slice).unwrap_or(&[]);
        if !voices.iter().any(|v| v == voice) {
            return Err(TtsError::Config(format!(
                "Voice {} not available for {}",
                voice, lang
            )));
        }
        Ok(resolved)
    }
}

impl<L, I, S> FromIterator<(L, I)> for VoiceCatalog
where
    L: AsRef<str>,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (L, I)>>(iter: T) -> Self {
        let mut catalog = Self::new();
        for (lang, voices) in iter {
            catalog.insert(lang.as_ref(), voices);
        }
        catalog
    }
}
