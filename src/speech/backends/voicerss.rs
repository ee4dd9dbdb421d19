//! VoiceRSS web API (mp3)

use super::{base_url, check_status, http_client, options, REQUEST_TIMEOUT};
use crate::phonemes::PhonemeEntry;
use crate::speech::{SynthesisEngine, VoiceCatalog};
use crate::{Result, TtsError};
use log::debug;
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

pub const DEFAULT_URL: &str = "https://api.voicerss.org";

/// Language code -> the single voice VoiceRSS offers for it
static VOICES: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("ca-es", "Catalan"),
        ("zh-cn", "Chinese (China)"),
        ("zh-hk", "Chinese (Hong Kong)"),
        ("zh-tw", "Chinese (Taiwan)"),
        ("da-dk", "Danish"),
        ("nl-nl", "Dutch"),
        ("en-au", "English (Australia)"),
        ("en-ca", "English (Canada)"),
        ("en-gb", "English (Great Britain)"),
        ("en-in", "English (India)"),
        ("en-us", "English (United States)"),
        ("fi-fi", "Finnish"),
        ("fr-ca", "French (Canada)"),
        ("fr-fr", "French (France)"),
        ("de-de", "German"),
        ("it-it", "Italian"),
        ("ja-jp", "Japanese"),
        ("ko-kr", "Korean"),
        ("nb-no", "Norwegian"),
        ("pl-pl", "Polish"),
        ("pt-br", "Portuguese (Brazil)"),
        ("pt-pt", "Portuguese (Portugal)"),
        ("ru-ru", "Russian"),
        ("es-mx", "Spanish (Mexico)"),
        ("es-es", "Spanish (Spain)"),
        ("sv-se", "Swedish (Sweden)"),
    ]
});

#[derive(Debug, Default, Deserialize)]
struct VoiceRssOptions {
    key: Option<String>,
    url: Option<String>,
}

pub struct VoiceRss {
    key: Option<String>,
    url: String,
    client: reqwest::blocking::Client,
}

impl VoiceRss {
    pub fn new(section: &Map<String, Value>) -> Result<Self> {
        let opts: VoiceRssOptions = options("voicerss", section)?;
        Ok(Self {
            key: opts.key.filter(|k| !k.is_empty()),
            url: base_url(opts.url.as_deref().unwrap_or(DEFAULT_URL)),
            client: http_client(REQUEST_TIMEOUT)?,
        })
    }

    /// Form parameters for one request
    pub fn request_params<'a>(&'a self, text: &'a str, lang: &'a str) -> Result<Vec<(&'static str, &'a str)>> {
        let key = self
            .key
            .as_deref()
            .ok_or_else(|| TtsError::Validation("The API key is undefined".to_string()))?;
        if text.is_empty() {
            return Err(TtsError::Backend("The text is undefined".to_string()));
        }
        Ok(vec![
            ("key", key),
            ("src", text),
            ("hl", lang),
            ("r", "0"),
            ("c", "mp3"),
            ("f", "44khz_16bit_stereo"),
            ("ssml", "false"),
            ("b64", "false"),
        ])
    }
}

impl SynthesisEngine for VoiceRss {
    fn name(&self) -> &str {
        "voicerss"
    }

    fn audio_ext(&self) -> &str {
        "mp3"
    }

    fn default_voice(&self, lang: &str) -> Option<String> {
        self.describe_voices()
            .ok()?
            .get(lang)?
            .first()
            .cloned()
    }

    fn validate(&self) -> Result<()> {
        if self.key.is_none() {
            return Err(TtsError::Validation(
                "VoiceRSS requires an API key (voicerss.key)".to_string(),
            ));
        }
        Ok(())
    }

    fn describe_voices(&self) -> Result<VoiceCatalog> {
        Ok(VOICES.iter().map(|(lang, voice)| (*lang, [*voice])).collect())
    }

    fn synthesize(
        &self,
        text: &str,
        lang: &str,
        _voice: &str,
        out: &Path,
    ) -> Result<Option<Vec<PhonemeEntry>>> {
        let params = self.request_params(text, lang)?;
        debug!("VoiceRSS request: hl={}", lang);
        let response = self.client.post(format!("{}/", self.url)).form(&params).send()?;
        let body = check_status(response)?.bytes()?;
        // errors come back as 200 with a text body
        if body.starts_with(b"ERROR") {
            return Err(TtsError::Backend(String::from_utf8_lossy(&body).into_owned()));
        }
        fs::write(out, &body)?;
        Ok(None)
    }
}
