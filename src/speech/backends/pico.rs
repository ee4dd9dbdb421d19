//! SVOX Pico via `pico2wave`
//!
//! Dependencies:
//! - pico2wave (install with: sudo apt install libttspico-utils)

use super::run;
use crate::phonemes::PhonemeEntry;
use crate::platform::find_executable;
use crate::speech::voices::normalize_lang;
use crate::speech::{SynthesisEngine, VoiceCatalog};
use crate::{Result, TtsError};
use serde_json::{Map, Value};
use std::path::Path;
use std::process::Command;

const PICO: &str = "pico2wave";

/// Pico names each language's single voice after its locale
pub const LOCALES: &[&str] = &["de-DE", "en-GB", "en-US", "es-ES", "fr-FR", "it-IT"];

#[derive(Debug, Clone, Default)]
pub struct Pico;

impl Pico {
    pub fn new(_section: &Map<String, Value>) -> Result<Self> {
        Ok(Self)
    }
}

/// Pico voice serving `lang`
pub fn voice_for_lang(lang: &str) -> Option<&'static str> {
    let lang = normalize_lang(lang);
    let voice = match lang.split('-').next().unwrap_or("") {
        "de" => "de-DE",
        "es" => "es-ES",
        "fr" => "fr-FR",
        "it" => "it-IT",
        "en" if lang.contains("gb") || lang.contains("uk") => "en-GB",
        "en" => "en-US",
        _ => return None,
    };
    Some(voice)
}

impl SynthesisEngine for Pico {
    fn name(&self) -> &str {
        "pico"
    }

    fn default_voice(&self, lang: &str) -> Option<String> {
        voice_for_lang(lang).map(String::from)
    }

    fn validate(&self) -> Result<()> {
        find_executable(&[PICO], "--help").map(|_| ()).ok_or_else(|| {
            TtsError::Validation(
                "PicoTTS is not installed. Run: sudo apt-get install libttspico-utils".to_string(),
            )
        })
    }

    fn describe_voices(&self) -> Result<VoiceCatalog> {
        Ok(LOCALES.iter().map(|l| (*l, [*l])).collect())
    }

    fn synthesize(
        &self,
        text: &str,
        _lang: &str,
        voice: &str,
        out: &Path,
    ) -> Result<Option<Vec<PhonemeEntry>>> {
        run(Command::new(PICO).arg("-l").arg(voice).arg("-w").arg(out).arg(text))?;
        Ok(None)
    }
}
