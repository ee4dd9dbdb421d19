//! Known word pronunciations in CMU dictionary format

use crate::{Result, TtsError};
use log::debug;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Words every assistant says often enough to ship a pronunciation for
const BUILTIN: &[(&str, &str)] = &[
    ("a", "AH0"),
    ("alexa", "AH0 L EH1 K S AH0"),
    ("and", "AH0 N D"),
    ("are", "AA1 R"),
    ("cortana", "K AO0 R T AE1 N AH0"),
    ("hello", "HH AH0 L OW1"),
    ("hey", "HH EY1"),
    ("hi", "HH AY1"),
    ("i", "AY1"),
    ("is", "IH1 Z"),
    ("it", "IH1 T"),
    ("mycroft", "M AY1 K R AO0 F T"),
    ("no", "N OW1"),
    ("of", "AH1 V"),
    ("okay", "OW2 K EY1"),
    ("siri", "S IH1 R IY0"),
    ("the", "DH AH0"),
    ("to", "T UW1"),
    ("what", "W AH1 T"),
    ("world", "W ER1 L D"),
    ("yes", "Y EH1 S"),
    ("you", "Y UW1"),
];

/// Lowercase word -> ARPAbet phonemes
#[derive(Debug, Clone)]
pub struct PronunciationDictionary {
    words: HashMap<String, Vec<String>>,
}

impl PronunciationDictionary {
    /// Dictionary with the built-in entries only
    pub fn new() -> Self {
        let mut dict = Self::empty();
        for (word, phones) in BUILTIN {
            dict.insert(word, phones.split_whitespace().map(str::to_string).collect());
        }
        dict
    }

    pub fn empty() -> Self {
        Self {
            words: HashMap::new(),
        }
    }

    /// Load entries from a CMU-format file on top of the built-ins
    ///
    /// Lines look like `HELLO  HH AH0 L OW1`; `;;;` starts a comment and
    /// alternate pronunciations (`HELLO(1)`) are ignored.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            TtsError::Config(format!(
                "Failed to read pronunciation dictionary {}: {}",
                path.display(),
                e
            ))
        })?;
        let mut dict = Self::new();
        dict.extend_from_cmu(&contents);
        debug!("Loaded pronunciation dictionary with {} words", dict.len());
        Ok(dict)
    }

    /// Merge CMU-format text into the dictionary
    pub fn extend_from_cmu(&mut self, contents: &str) {
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(";;;") {
                continue;
            }
            let mut parts = line.split_whitespace();
            let Some(word) = parts.next() else { continue };
            if word.ends_with(')') {
                continue;
            }
            let phones: Vec<String> = parts.map(str::to_string).collect();
            if !phones.is_empty() {
                self.insert(word, phones);
            }
        }
    }

    pub fn insert(&mut self, word: &str, phones: Vec<String>) {
        self.words.insert(word.to_lowercase(), phones);
    }

    /// Case-insensitive lookup
    pub fn lookup(&self, word: &str) -> Option<&[String]> {
        self.words.get(&word.to_lowercase()).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for PronunciationDictionary {
    fn default() -> Self {
        Self::new()
    }
}
