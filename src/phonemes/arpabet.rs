//! ARPAbet <-> IPA conversion
//!
//! ARPAbet was invented for English and is the notation of the CMU
//! pronouncing dictionary. Stressed variants only matter for the schwa
//! vowels, which get their own IPA symbols.

use once_cell::sync::Lazy;
use std::collections::HashMap;

const PAIRS: &[(&str, &str)] = &[
    ("AA", "ɑ"),
    ("AE", "æ"),
    ("AH", "ʌ"),
    ("AH0", "ə"),
    ("AO", "ɔ"),
    ("AW", "aʊ"),
    ("AY", "aɪ"),
    ("EH", "ɛ"),
    ("ER", "ɝ"),
    ("ER0", "ɚ"),
    ("EY", "eɪ"),
    ("IH", "ɪ"),
    ("IH0", "ɨ"),
    ("IY", "i"),
    ("OW", "oʊ"),
    ("OY", "ɔɪ"),
    ("UH", "ʊ"),
    ("UW", "u"),
    ("B", "b"),
    ("CH", "tʃ"),
    ("D", "d"),
    ("DH", "ð"),
    ("EL", "l̩"),
    ("EM", "m̩"),
    ("EN", "n̩"),
    ("F", "f"),
    ("G", "ɡ"),
    ("HH", "h"),
    ("JH", "dʒ"),
    ("K", "k"),
    ("L", "l"),
    ("M", "m"),
    ("N", "n"),
    ("NG", "ŋ"),
    ("P", "p"),
    ("Q", "ʔ"),
    ("R", "ɹ"),
    ("S", "s"),
    ("SH", "ʃ"),
    ("T", "t"),
    ("TH", "θ"),
    ("V", "v"),
    ("W", "w"),
    ("WH", "ʍ"),
    ("Y", "j"),
    ("Z", "z"),
    ("ZH", "ʒ"),
];

static ARPABET_TO_IPA: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| PAIRS.iter().copied().collect());

static IPA_TO_ARPABET: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| PAIRS.iter().map(|&(a, i)| (i, a)).collect());

/// Convert an ARPAbet symbol (any case, optional stress digit) to IPA
pub fn arpabet_to_ipa(symbol: &str) -> Option<&'static str> {
    let upper = symbol.to_uppercase();
    if let Some(ipa) = ARPABET_TO_IPA.get(upper.as_str()) {
        return Some(*ipa);
    }
    let base = upper.trim_end_matches(|c: char| c.is_ascii_digit());
    ARPABET_TO_IPA.get(base).copied()
}

/// Convert an IPA symbol back to ARPAbet
pub fn ipa_to_arpabet(symbol: &str) -> Option<&'static str> {
    IPA_TO_ARPABET.get(symbol).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arpabet_to_ipa() {
        assert_eq!(arpabet_to_ipa("AE"), Some("æ"));
        assert_eq!(arpabet_to_ipa("ae1"), Some("æ"));
        assert_eq!(arpabet_to_ipa("AH0"), Some("ə"));
        assert_eq!(arpabet_to_ipa("AH1"), Some("ʌ"));
        assert_eq!(arpabet_to_ipa("XX"), None);
    }

    #[test]
    fn test_ipa_to_arpabet() {
        assert_eq!(ipa_to_arpabet("ʃ"), Some("SH"));
        assert_eq!(ipa_to_arpabet("ə"), Some("AH0"));
        assert_eq!(ipa_to_arpabet("?"), None);
    }
}
