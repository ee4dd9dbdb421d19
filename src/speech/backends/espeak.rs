//! eSpeak and eSpeak NG
//!
//! Dependencies:
//! - espeak (install with: sudo apt install espeak) or
//! - espeak-ng (install with: sudo apt install espeak-ng)

use super::{options, run};
use crate::phonemes::PhonemeEntry;
use crate::platform::find_executable;
use crate::speech::{SynthesisEngine, VoiceCatalog};
use crate::text::ssml::rewrite_percentages;
use crate::{Result, TtsError};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use std::process::Command;

/// Variants espeak applies on top of every language voice
pub const VARIANTS: &[&str] = &[
    "m1", "m2", "m3", "m4", "m5", "m6", "m7", "f1", "f2", "f3", "f4", "f5", "croak", "whisper",
];

const SSML_TAGS: &[&str] = &[
    "speak", "say-as", "voice", "audio", "prosody", "break", "emphasis", "sub", "tts:style", "p",
    "s", "mark",
];

#[derive(Debug, Default, Deserialize)]
struct EspeakOptions {
    /// Path to the executable
    bin: Option<String>,
}

/// Local espeak/espeak-ng engine
#[derive(Debug, Clone)]
pub struct Espeak {
    name: &'static str,
    bin: String,
}

impl Espeak {
    pub fn espeak(section: &Map<String, Value>) -> Result<Self> {
        Self::with_name("espeak", section)
    }

    pub fn espeak_ng(section: &Map<String, Value>) -> Result<Self> {
        Self::with_name("espeak-ng", section)
    }

    fn with_name(name: &'static str, section: &Map<String, Value>) -> Result<Self> {
        let opts: EspeakOptions = options(name, section)?;
        Ok(Self {
            name,
            bin: opts.bin.unwrap_or_else(|| name.to_string()),
        })
    }

    /// Arguments for one synthesis call
    pub fn command_args(&self, text: &str, lang: &str, voice: &str, out: &Path) -> Vec<String> {
        vec![
            "-m".into(),
            "-w".into(),
            out.display().to_string(),
            "-v".into(),
            format!("{}+{}", lang, voice),
            text.to_string(),
        ]
    }
}

/// Parse `espeak --voices` output into a catalog
///
/// Every listed language gets the full variant list.
pub fn parse_voice_list(output: &str) -> VoiceCatalog {
    let mut catalog = VoiceCatalog::new();
    for line in output.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            continue;
        }
        catalog.insert(fields[1], VARIANTS.iter().copied());
    }
    catalog
}

impl SynthesisEngine for Espeak {
    fn name(&self) -> &str {
        self.name
    }

    fn ssml_tags(&self) -> Vec<String> {
        SSML_TAGS.iter().map(|t| t.to_string()).collect()
    }

    fn modify_tag(&self, tag: &str) -> String {
        rewrite_percentages(tag)
    }

    fn default_voice(&self, _lang: &str) -> Option<String> {
        Some("m1".into())
    }

    fn validate(&self) -> Result<()> {
        find_executable(&[self.bin.as_str()], "--version")
            .map(|_| ())
            .ok_or_else(|| {
                TtsError::Validation(format!(
                    "{} is not installed. Run: sudo apt-get install {}",
                    self.bin, self.name
                ))
            })
    }

    fn describe_voices(&self) -> Result<VoiceCatalog> {
        let output = run(Command::new(&self.bin).arg("--voices"))?;
        Ok(parse_voice_list(&String::from_utf8_lossy(&output.stdout)))
    }

    fn synthesize(
        &self,
        text: &str,
        lang: &str,
        voice: &str,
        out: &Path,
    ) -> Result<Option<Vec<PhonemeEntry>>> {
        run(Command::new(&self.bin).args(self.command_args(text, lang, voice, out)))?;
        Ok(None)
    }
}
