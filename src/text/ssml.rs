//! SSML tag filtering and attribute rewriting

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

static PERCENT_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(["'])([+-]?)(\d+(?:\.\d+)?)%["']"#).expect("valid percentage regex")
});

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([\w:-]+)\s*=\s*(["'])([^"']*)["']"#).expect("valid attribute regex")
});

/// Strip every tag from `text`
pub fn remove_ssml(text: &str) -> String {
    TAG.replace_all(text, "").replace("  ", " ")
}

/// Element name of a tag: `<prosody rate="x">` and `</prosody>` give `prosody`
pub fn tag_name(tag: &str) -> Option<&str> {
    let inner = tag.strip_prefix('<')?.strip_suffix('>')?;
    let inner = inner.trim_start().trim_start_matches('/').trim_start();
    let end = inner
        .find(|c: char| c.is_whitespace() || c == '/')
        .unwrap_or(inner.len());
    let name = &inner[..end];
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Keep only tags whose element is in `allowed`, passing each kept tag
/// through `modify`
///
/// An empty allow-list means the engine has no SSML support at all and
/// every tag is removed.
pub fn validate_ssml(text: &str, allowed: &[String], modify: &dyn Fn(&str) -> String) -> String {
    if allowed.is_empty() {
        return remove_ssml(text);
    }

    TAG.replace_all(text, |caps: &Captures| {
        let tag = &caps[0];
        match tag_name(tag) {
            Some(name) if allowed.iter().any(|a| a == name) => modify(tag),
            _ => String::new(),
        }
    })
    .replace("  ", " ")
}

/// Rewrite quoted percentage values into signed fractions
///
/// `vocal-tract-length="+15%"` becomes `vocal-tract-length="0.15"` and
/// `"-10%"` becomes `"-0.1"`.
pub fn rewrite_percentages(tag: &str) -> String {
    PERCENT_VALUE
        .replace_all(tag, |caps: &Captures| {
            let quote = &caps[1];
            let magnitude: f64 = caps[3].parse().unwrap_or(0.0);
            let fraction = if &caps[2] == "-" {
                -magnitude / 100.0
            } else {
                magnitude / 100.0
            };
            format!("{quote}{fraction}{quote}")
        })
        .into_owned()
}

/// Rewrite named prosody rates into the numeric stretch values mimic expects
///
/// Only whole quoted attribute values are rewritten, and a `speed` attribute
/// is renamed to `rate`. Element names and other attributes are left alone.
pub fn rewrite_prosody_keywords(tag: &str) -> String {
    const KEYWORDS: &[(&str, &str)] = &[
        ("x-slow", "0.4"),
        ("x-high", "1.6"),
        ("slow", "0.7"),
        ("medium", "1.0"),
        ("high", "1.3"),
    ];

    ATTRIBUTE
        .replace_all(tag, |caps: &Captures| {
            let name = match &caps[1] {
                "speed" => "rate",
                other => other,
            };
            let quote = &caps[2];
            let value = KEYWORDS
                .iter()
                .find(|(keyword, _)| *keyword == &caps[3])
                .map_or(&caps[3], |(_, number)| *number);
            format!("{name}={quote}{value}{quote}")
        })
        .into_owned()
}
