//! MaryTTS HTTP server

use super::{base_url, check_status, http_client, options, REQUEST_TIMEOUT};
use crate::phonemes::PhonemeEntry;
use crate::speech::voices::normalize_lang;
use crate::speech::{SynthesisEngine, VoiceCatalog};
use crate::{Result, TtsError};
use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_URL: &str = "http://mary.dfki.de:59125";
pub const DEFAULT_VOICE: &str = "cmu-bdl-hsmm";

#[derive(Debug, Default, Deserialize)]
struct MaryOptions {
    url: Option<String>,
}

pub struct MaryTts {
    url: String,
    client: reqwest::blocking::Client,
}

impl MaryTts {
    pub fn new(section: &Map<String, Value>) -> Result<Self> {
        let opts: MaryOptions = options("marytts", section)?;
        Ok(Self {
            url: base_url(opts.url.as_deref().unwrap_or(DEFAULT_URL)),
            client: http_client(REQUEST_TIMEOUT)?,
        })
    }

    /// Replace the default request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = http_client(timeout)?;
        Ok(self)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn get_text(&self, path: &str) -> Result<String> {
        let response = self.client.get(format!("{}{}", self.url, path)).send()?;
        Ok(check_status(response)?.text()?)
    }
}

/// MaryTTS locale for a language code
pub fn locale(lang: &str) -> String {
    let lang = normalize_lang(lang);
    match lang.as_str() {
        "en-uk" | "en-gb" => "en_GB".to_string(),
        l if l.starts_with("en") => "en_US".to_string(),
        _ => lang,
    }
}

/// Build a catalog from `/locales` and `/voices` responses
///
/// `/voices` lines are `<voice> <locale> <gender> ...`.
pub fn parse_voices(locales: &str, voices: &str) -> VoiceCatalog {
    let mut catalog = VoiceCatalog::new();
    for locale in locales.split_whitespace() {
        catalog.insert(locale, Vec::<String>::new());
    }
    for line in voices.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            continue;
        }
        catalog.insert(fields[1], [fields[0]]);
    }
    catalog
}

impl SynthesisEngine for MaryTts {
    fn name(&self) -> &str {
        "marytts"
    }

    fn default_voice(&self, _lang: &str) -> Option<String> {
        Some(DEFAULT_VOICE.into())
    }

    fn validate(&self) -> Result<()> {
        let ok = self
            .get_text("/version")
            .map(|v| v.starts_with("Mary TTS server"))
            .unwrap_or(false);
        if ok {
            Ok(())
        } else {
            Err(TtsError::Validation(format!(
                "MaryTTS server could not be verified. Check your connection to the server: {}",
                self.url
            )))
        }
    }

    fn describe_voices(&self) -> Result<VoiceCatalog> {
        let locales = self.get_text("/locales")?;
        let voices = self.get_text("/voices")?;
        Ok(parse_voices(&locales, &voices))
    }

    fn synthesize(
        &self,
        text: &str,
        lang: &str,
        voice: &str,
        out: &Path,
    ) -> Result<Option<Vec<PhonemeEntry>>> {
        let locale = locale(lang);
        debug!("MaryTTS request: locale={} voice={}", locale, voice);
        let response = self
            .client
            .get(format!("{}/process", self.url))
            .query(&[
                ("INPUT_TYPE", "TEXT"),
                ("AUDIO", "WAVE_FILE"),
                ("OUTPUT_TYPE", "AUDIO"),
                ("LOCALE", locale.as_str()),
                ("VOICE", voice),
                ("INPUT_TEXT", text),
            ])
            .send()?;
        let audio = check_status(response)?.bytes()?;
        fs::write(out, &audio)?;
        Ok(None)
    }
}
