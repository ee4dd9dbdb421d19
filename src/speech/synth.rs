//! Synthesis engine abstraction
//!
//! Every backend implements [`SynthesisEngine`]; the pipeline only ever
//! holds a `Box<dyn SynthesisEngine>` obtained from [`create_engine`].

use super::backends::{
    espeak::Espeak, festival::Festival, marytts::MaryTts, mimic::Mimic, pico::Pico,
    voicerss::VoiceRss,
};
use super::voices::VoiceCatalog;
use crate::phonemes::PhonemeEntry;
use crate::text::DEFAULT_MAX_CHUNK_CHARS;
use crate::{Result, TtsError};
use log::info;
use serde_json::{Map, Value};
use std::path::Path;

/// Module names accepted by [`create_engine`]
pub const MODULES: &[&str] = &[
    "espeak",
    "espeak-ng",
    "mimic",
    "pico",
    "festival",
    "marytts",
    "voicerss",
];

/// Text-to-speech backend contract
pub trait SynthesisEngine: Send + Sync {
    /// Module name, e.g. `espeak`
    fn name(&self) -> &str;

    /// Container of the produced audio
    fn audio_ext(&self) -> &str {
        "wav"
    }

    /// SSML elements the engine understands; everything else is stripped
    fn ssml_tags(&self) -> Vec<String> {
        Vec::new()
    }

    /// Rewrite a supported tag into the engine's dialect
    fn modify_tag(&self, tag: &str) -> String {
        tag.to_string()
    }

    /// Longest chunk sent in one synthesis call
    fn max_chunk_chars(&self) -> usize {
        DEFAULT_MAX_CHUNK_CHARS
    }

    /// Voice used when the configuration names none
    fn default_voice(&self, _lang: &str) -> Option<String> {
        None
    }

    /// Check executables, credentials or server reachability
    fn validate(&self) -> Result<()>;

    /// Languages and voices the engine offers; empty if it can't tell
    fn describe_voices(&self) -> Result<VoiceCatalog>;

    /// Synthesize `text` into `out`, returning native phonemes if the
    /// engine reports them
    fn synthesize(
        &self,
        text: &str,
        lang: &str,
        voice: &str,
        out: &Path,
    ) -> Result<Option<Vec<PhonemeEntry>>>;
}

/// Build the engine named `module` from its configuration section
///
/// The engine is validated before it is returned, so a missing
/// executable or credential fails here rather than on the first request.
pub fn create_engine(module: &str, section: &Map<String, Value>) -> Result<Box<dyn SynthesisEngine>> {
    let engine: Box<dyn SynthesisEngine> = match module {
        "espeak" => Box::new(Espeak::espeak(section)?),
        "espeak-ng" => Box::new(Espeak::espeak_ng(section)?),
        "mimic" => Box::new(Mimic::new(section)?),
        "pico" => Box::new(Pico::new(section)?),
        "festival" => Box::new(Festival::new(section)?),
        "marytts" => Box::new(MaryTts::new(section)?),
        "voicerss" => Box::new(VoiceRss::new(section)?),
        _ => {
            return Err(TtsError::Config(format!(
                "Unknown TTS module '{}', expected one of: {}",
                module,
                MODULES.join(", ")
            )))
        }
    };

    engine.validate()?;
    info!("Initialized {} TTS engine", engine.name());
    Ok(engine)
}
