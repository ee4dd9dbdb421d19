//! Rule-based letter-to-phoneme guesser for English
//!
//! Greedy longest match: at each position try the three letter cluster,
//! then two, then a single letter. A position where nothing matches makes
//! the whole word fail.

use once_cell::sync::Lazy;
use std::collections::HashMap;

static CLUSTERS: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let rules: &[(&str, &[&str])] = &[
        // three letters
        ("igh", &["AY"]),
        ("tch", &["CH"]),
        ("dge", &["JH"]),
        ("sch", &["S", "K"]),
        ("ear", &["IH", "R"]),
        ("air", &["EH", "R"]),
        ("our", &["AW", "R"]),
        ("ing", &["IH", "NG"]),
        ("eau", &["OW"]),
        // two letters
        ("th", &["TH"]),
        ("sh", &["SH"]),
        ("ch", &["CH"]),
        ("ph", &["F"]),
        ("wh", &["W"]),
        ("ck", &["K"]),
        ("ng", &["NG"]),
        ("qu", &["K", "W"]),
        ("gh", &["G"]),
        ("kn", &["N"]),
        ("wr", &["R"]),
        ("ee", &["IY"]),
        ("ea", &["IY"]),
        ("ie", &["IY"]),
        ("oo", &["UW"]),
        ("ue", &["UW"]),
        ("ew", &["UW"]),
        ("ou", &["AW"]),
        ("ow", &["OW"]),
        ("oa", &["OW"]),
        ("oi", &["OY"]),
        ("oy", &["OY"]),
        ("ai", &["EY"]),
        ("ay", &["EY"]),
        ("ei", &["EY"]),
        ("ey", &["EY"]),
        ("au", &["AO"]),
        ("aw", &["AO"]),
        ("ar", &["AA", "R"]),
        ("or", &["AO", "R"]),
        ("er", &["ER"]),
        ("ir", &["ER"]),
        ("ur", &["ER"]),
        // single letters
        ("a", &["AE"]),
        ("b", &["B"]),
        ("c", &["K"]),
        ("d", &["D"]),
        ("e", &["EH"]),
        ("f", &["F"]),
        ("g", &["G"]),
        ("h", &["HH"]),
        ("i", &["IH"]),
        ("j", &["JH"]),
        ("k", &["K"]),
        ("l", &["L"]),
        ("m", &["M"]),
        ("n", &["N"]),
        ("o", &["AA"]),
        ("p", &["P"]),
        ("q", &["K"]),
        ("r", &["R"]),
        ("s", &["S"]),
        ("t", &["T"]),
        ("u", &["AH"]),
        ("v", &["V"]),
        ("w", &["W"]),
        ("x", &["K", "S"]),
        ("y", &["Y"]),
        ("z", &["Z"]),
        // apostrophes are silent
        ("'", &[]),
    ];
    rules.iter().copied().collect()
});

/// Longest cluster the table knows about
const MAX_CLUSTER: usize = 3;

/// Guess ARPAbet phonemes for a single word, or `None` if any letter run
/// has no rule
pub fn guess_word(word: &str) -> Option<Vec<&'static str>> {
    let letters: Vec<char> = word.to_lowercase().chars().collect();
    if letters.is_empty() {
        return None;
    }

    let mut phones = Vec::new();
    let mut pos = 0;
    while pos < letters.len() {
        let longest = MAX_CLUSTER.min(letters.len() - pos);
        let matched = (1..=longest).rev().find_map(|len| {
            let cluster: String = letters[pos..pos + len].iter().collect();
            CLUSTERS.get(cluster.as_str()).map(|p| (len, *p))
        });

        let (len, cluster_phones) = matched?;
        phones.extend_from_slice(cluster_phones);
        pos += len;
    }

    Some(phones)
}
