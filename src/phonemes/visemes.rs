//! Phoneme to viseme (mouth shape) mapping
//!
//! Groups follow the Jeffers phoneme-to-viseme table, collapsed onto the
//! seven mouth shapes `0`-`6` used by lip-sync animations.

use super::PhonemeEntry;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Mouth shape used for anything not in the table (closed mouth)
pub const DEFAULT_VISEME: &str = "4";

/// One mouth shape with its duration in seconds
#[derive(Debug, Clone, PartialEq)]
pub struct VisemeEntry {
    pub code: &'static str,
    pub duration: f64,
}

/// Lowercase ARPAbet symbol -> mouth shape code
pub static VISEMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let groups: &[(&str, &[&str])] = &[
        // lip to teeth
        ("5", &["v", "f"]),
        // rounded
        ("2", &["uh", "w", "uw", "er", "r", "ow"]),
        // closed lips, also blank mouth
        ("4", &["b", "p", "m", "pau"]),
        ("1", &["aw"]),
        // tongue, teeth and hissing sounds
        (
            "3",
            &[
                "th", "dh", "zh", "ch", "sh", "jh", "z", "s", "n", "t", "d", "l", "g", "ng",
                "k",
            ],
        ),
        ("6", &["oy", "ao"]),
        // open
        (
            "0",
            &["ae", "eh", "ey", "ah", "ih", "y", "iy", "aa", "ay", "ax", "hh"],
        ),
    ];

    let mut m = HashMap::new();
    for (code, symbols) in groups {
        for symbol in symbols.iter() {
            m.insert(*symbol, *code);
        }
    }
    m
});

/// Normalize a phoneme symbol for lookup: lowercase, stress digits removed
fn normalize(symbol: &str) -> String {
    symbol
        .chars()
        .filter(|c| !c.is_ascii_digit())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Look up the mouth shape for a single phoneme symbol
pub fn viseme_for(symbol: &str) -> &'static str {
    VISEMES
        .get(normalize(symbol).as_str())
        .copied()
        .unwrap_or(DEFAULT_VISEME)
}

/// Map a phoneme sequence 1:1 onto mouth shapes, keeping durations
pub fn map_visemes(phonemes: &[PhonemeEntry]) -> Vec<VisemeEntry> {
    phonemes
        .iter()
        .map(|p| VisemeEntry {
            code: viseme_for(&p.symbol),
            duration: p.duration,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pat() {
        let phonemes = vec![
            PhonemeEntry::new("p", 0.1),
            PhonemeEntry::new("ae", 0.2),
            PhonemeEntry::new("t", 0.1),
        ];
        let visemes = map_visemes(&phonemes);
        let codes: Vec<_> = visemes.iter().map(|v| v.code).collect();
        assert_eq!(codes, vec!["4", "0", "3"]);
        assert_eq!(visemes[1].duration, 0.2);
    }

    #[test]
    fn test_case_and_stress_normalized() {
        assert_eq!(viseme_for("EY1"), "0");
        assert_eq!(viseme_for("OW0"), "2");
        assert_eq!(viseme_for("F"), "5");
        assert_eq!(viseme_for("AW2"), "1");
        assert_eq!(viseme_for("OY"), "6");
    }

    #[test]
    fn test_unmapped_defaults() {
        assert_eq!(viseme_for("xx"), DEFAULT_VISEME);
        assert_eq!(viseme_for(""), DEFAULT_VISEME);
        assert_eq!(viseme_for("."), DEFAULT_VISEME);
    }

    #[test]
    fn test_empty_input() {
        assert!(map_visemes(&[]).is_empty());
    }
}
