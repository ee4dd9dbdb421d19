//! Phonemes and lip-sync visemes
//!
//! A phoneme sequence is an ordered list of `(symbol, duration)` pairs that
//! is time-aligned to the synthesized audio. Backends that can report their
//! own phonemes (mimic) hand them back in the `symbol:duration` annotation
//! format; everything else goes through [`PhonemeResolver`].

pub mod arpabet;
pub mod dictionary;
pub mod guess;
pub mod resolver;
pub mod visemes;

pub use resolver::{CommandTranscriber, PhonemeResolver, Transcriber};
pub use visemes::{map_visemes, VisemeEntry};

use std::fmt;

/// Symbol inserted between words of a multi-word phrase
pub const PAUSE: &str = "pau";

/// One phoneme with its duration in seconds
#[derive(Debug, Clone, PartialEq)]
pub struct PhonemeEntry {
    pub symbol: String,
    pub duration: f64,
}

impl PhonemeEntry {
    pub fn new(symbol: impl Into<String>, duration: f64) -> Self {
        Self {
            symbol: symbol.into(),
            duration,
        }
    }
}

impl fmt::Display for PhonemeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.symbol, self.duration)
    }
}

/// Parse a `symbol:duration symbol:duration ...` annotation
///
/// Tokens that are not a well-formed pair are skipped, matching how
/// engine output with stray whitespace or trailing newlines is handled.
pub fn parse_annotation(annotation: &str) -> Vec<PhonemeEntry> {
    annotation
        .split_whitespace()
        .filter_map(|pair| {
            let (symbol, duration) = pair.split_once(':')?;
            if symbol.is_empty() {
                return None;
            }
            let duration = duration.parse::<f64>().ok()?;
            Some(PhonemeEntry::new(symbol, duration))
        })
        .collect()
}

/// Serialize phonemes to the annotation format read by [`parse_annotation`]
pub fn format_annotation(phonemes: &[PhonemeEntry]) -> String {
    phonemes
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
