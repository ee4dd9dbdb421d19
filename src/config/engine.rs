//! Engine selection and voice-effects configuration (JSON)
//!
//! ```json
//! {
//!   "module": "espeak",
//!   "espeak": { "lang": "en-us", "voice": "m1" },
//!   "effects": { "pitch": { "n_semitones": 2 }, "reverb": {} }
//! }
//! ```
//!
//! An `effects` object inside the engine's own section takes precedence
//! over the top-level one. Effects run in the order they are written.

use crate::{Result, TtsError};
use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Engine used when the configuration names none
pub const DEFAULT_MODULE: &str = "espeak";

/// Language used when the engine section names none
pub const DEFAULT_LANG: &str = "en-us";

fn default_module() -> String {
    DEFAULT_MODULE.to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TtsConfig {
    #[serde(default = "default_module")]
    pub module: String,
    #[serde(default)]
    effects: Map<String, Value>,
    /// Per-engine sections, keyed by module name
    #[serde(flatten)]
    sections: Map<String, Value>,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MODULE)
    }
}

impl TtsConfig {
    /// Configuration selecting `module` with an empty section
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            effects: Map::new(),
            sections: Map::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        debug!("Parsed TTS config for module {}", config.module);
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            TtsError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Replace the section for the selected module
    pub fn with_section(mut self, section: Map<String, Value>) -> Self {
        self.sections
            .insert(self.module.clone(), Value::Object(section));
        self
    }

    /// Replace the top-level effects
    pub fn with_effects(mut self, effects: Map<String, Value>) -> Self {
        self.effects = effects;
        self
    }

    /// Section for the selected module; also looked up under `tts`
    pub fn section(&self) -> Result<Map<String, Value>> {
        let section = self.sections.get(&self.module).or_else(|| {
            self.sections
                .get("tts")
                .and_then(|tts| tts.get(&self.module))
        });
        match section {
            None | Some(Value::Null) => Ok(Map::new()),
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(_) => Err(TtsError::Config(format!(
                "Section for module {} must be an object",
                self.module
            ))),
        }
    }

    fn section_str(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .section()?
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(String::from))
    }

    /// Configured language, defaulting to [`DEFAULT_LANG`]
    pub fn lang(&self) -> Result<String> {
        Ok(self
            .section_str("lang")?
            .unwrap_or_else(|| DEFAULT_LANG.to_string()))
    }

    /// Configured voice, if any
    pub fn voice(&self) -> Result<Option<String>> {
        self.section_str("voice")
    }

    /// Voice effects in configured order
    pub fn effects(&self) -> Result<Map<String, Value>> {
        match self.section()?.get("effects") {
            Some(Value::Object(effects)) => Ok(effects.clone()),
            Some(Value::Null) | None => Ok(self.effects.clone()),
            Some(_) => Err(TtsError::Config("effects must be an object".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TtsConfig::from_json("{}").unwrap();
        assert_eq!(config.module, "espeak");
        assert_eq!(config.lang().unwrap(), "en-us");
        assert_eq!(config.voice().unwrap(), None);
        assert!(config.effects().unwrap().is_empty());
    }

    #[test]
    fn test_section_and_effect_order() {
        let config = TtsConfig::from_json(
            r#"{
                "module": "mimic",
                "mimic": {"lang": "en-gb", "voice": "slt"},
                "effects": {"tempo": {"factor": 1.2}, "pitch": {"n_semitones": 1}, "echo": {}}
            }"#,
        )
        .unwrap();
        assert_eq!(config.lang().unwrap(), "en-gb");
        assert_eq!(config.voice().unwrap().as_deref(), Some("slt"));
        let names: Vec<_> = config.effects().unwrap().keys().cloned().collect();
        assert_eq!(names, vec!["tempo", "pitch", "echo"]);
    }

    #[test]
    fn test_section_effects_win() {
        let config = TtsConfig::from_json(
            r#"{
                "module": "espeak",
                "espeak": {"effects": {"reverse": {}}},
                "effects": {"pitch": {"n_semitones": 1}}
            }"#,
        )
        .unwrap();
        let names: Vec<_> = config.effects().unwrap().keys().cloned().collect();
        assert_eq!(names, vec!["reverse"]);
    }

    #[test]
    fn test_nested_tts_section() {
        let config =
            TtsConfig::from_json(r#"{"module": "pico", "tts": {"pico": {"lang": "de-de"}}}"#)
                .unwrap();
        assert_eq!(config.lang().unwrap(), "de-de");
    }

    #[test]
    fn test_bad_section() {
        let config = TtsConfig::from_json(r#"{"module": "pico", "pico": 3}"#).unwrap();
        assert!(matches!(config.section(), Err(TtsError::Config(_))));
    }
}
