//! Phonetic spelling substitution
//!
//! Engines mispronounce some words; a phonetic spelling dictionary maps
//! those words (case-insensitively) to a spelling the engine reads
//! correctly, e.g. "jalapeno" -> "hallapeenyo".

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\w']+").expect("valid word regex"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// Spellings shipped with the crate
pub static DEFAULT_SPELLINGS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("jalapeno", "hallapeenyo");
    m.insert("gif", "jif");
    m.insert("nginx", "engine x");
    m.insert("sql", "sequel");
    m.insert("wifi", "why fi");
    m
});

/// Lowercase word -> replacement spelling
#[derive(Debug, Clone, Default)]
pub struct PhoneticSpellings {
    spellings: HashMap<String, String>,
}

impl PhoneticSpellings {
    /// Empty dictionary
    pub fn new() -> Self {
        Self::default()
    }

    /// Dictionary preloaded with [`DEFAULT_SPELLINGS`]
    pub fn with_defaults() -> Self {
        let mut spellings = Self::new();
        for (word, spelling) in DEFAULT_SPELLINGS.iter() {
            spellings.insert(word, spelling);
        }
        spellings
    }

    pub fn insert(&mut self, word: &str, spelling: &str) {
        self.spellings.insert(word.to_lowercase(), spelling.to_string());
    }

    pub fn get(&self, word: &str) -> Option<&str> {
        self.spellings.get(&word.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.spellings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spellings.is_empty()
    }

    /// Substitute every known word in `text`, leaving SSML tags untouched
    pub fn apply(&self, text: &str) -> String {
        if self.spellings.is_empty() {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for tag in TAG.find_iter(text) {
            out.push_str(&self.apply_plain(&text[last..tag.start()]));
            out.push_str(tag.as_str());
            last = tag.end();
        }
        out.push_str(&self.apply_plain(&text[last..]));
        out
    }

    fn apply_plain(&self, text: &str) -> String {
        WORD.replace_all(text, |caps: &Captures| {
            let word = &caps[0];
            self.get(word).unwrap_or(word).to_string()
        })
        .into_owned()
    }
}

impl<S: AsRef<str>> FromIterator<(S, S)> for PhoneticSpellings {
    fn from_iter<I: IntoIterator<Item = (S, S)>>(iter: I) -> Self {
        let mut spellings = Self::new();
        for (word, spelling) in iter {
            spellings.insert(word.as_ref(), spelling.as_ref());
        }
        spellings
    }
}
