//! Mimic: English only, reports phoneme timings alongside the audio

use super::{options, run};
use crate::phonemes::{parse_annotation, PhonemeEntry};
use crate::platform::find_executable;
use crate::speech::voices::{base_lang, normalize_lang};
use crate::speech::{SynthesisEngine, VoiceCatalog};
use crate::text::ssml::rewrite_prosody_keywords;
use crate::{Result, TtsError};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use std::process::Command;

const SSML_TAGS: &[&str] = &["speak", "ssml", "phoneme", "voice", "audio", "prosody"];

#[derive(Debug, Default, Deserialize)]
struct MimicOptions {
    bin: Option<String>,
    /// Multiplier on phoneme durations (>1 is slower)
    duration_stretch: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Mimic {
    bin: String,
    duration_stretch: Option<f64>,
}

impl Mimic {
    pub fn new(section: &Map<String, Value>) -> Result<Self> {
        let opts: MimicOptions = options("mimic", section)?;
        Ok(Self {
            bin: opts.bin.unwrap_or_else(|| "mimic".to_string()),
            duration_stretch: opts.duration_stretch,
        })
    }

    pub fn command_args(&self, text: &str, voice: &str, out: &Path) -> Vec<String> {
        let mut args = vec![
            "-voice".to_string(),
            voice.to_string(),
            "-psdur".into(),
            "-ssml".into(),
        ];
        if let Some(stretch) = self.duration_stretch {
            args.push("--setf".into());
            args.push(format!("duration_stretch={}", stretch));
        }
        args.extend([
            "-o".to_string(),
            out.display().to_string(),
            "-t".into(),
            text.to_string(),
        ]);
        args
    }
}

/// Parse `mimic -lv` output ("Voices available: ap slt ...")
pub fn parse_voice_list(output: &str) -> VoiceCatalog {
    let mut catalog = VoiceCatalog::new();
    catalog.insert("en", output.split_whitespace().skip(2));
    catalog
}

impl SynthesisEngine for Mimic {
    fn name(&self) -> &str {
        "mimic"
    }

    fn ssml_tags(&self) -> Vec<String> {
        SSML_TAGS.iter().map(|t| t.to_string()).collect()
    }

    fn modify_tag(&self, tag: &str) -> String {
        rewrite_prosody_keywords(tag)
    }

    fn default_voice(&self, _lang: &str) -> Option<String> {
        Some("ap".into())
    }

    fn validate(&self) -> Result<()> {
        find_executable(&[self.bin.as_str()], "--version")
            .map(|_| ())
            .ok_or_else(|| {
                TtsError::Validation(
                    "Mimic was not found. See https://forslund.github.io/mycroft-desktop-repo/"
                        .to_string(),
                )
            })
    }

    fn describe_voices(&self) -> Result<VoiceCatalog> {
        let output = run(Command::new(&self.bin).arg("-lv"))?;
        Ok(parse_voice_list(&String::from_utf8_lossy(&output.stdout)))
    }

    fn synthesize(
        &self,
        text: &str,
        lang: &str,
        voice: &str,
        out: &Path,
    ) -> Result<Option<Vec<PhonemeEntry>>> {
        if base_lang(&normalize_lang(lang)) != "en" {
            return Err(TtsError::Config(format!("Mimic does not support {}", lang)));
        }
        let output = run(Command::new(&self.bin).args(self.command_args(text, voice, out)))?;
        let phonemes = parse_annotation(&String::from_utf8_lossy(&output.stdout));
        Ok(if phonemes.is_empty() { None } else { Some(phonemes) })
    }
}
