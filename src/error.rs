//! Error types for text2speech

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Main error type for text2speech
#[derive(Error, Debug)]
pub enum TtsError {
    /// Bad or missing voice, language or module name
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend unusable here, e.g. no executable or no API key
    #[error("Validation error: {0}")]
    Validation(String),

    /// Network failure, non-200 response or failed synthesis process
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Backend timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid parameter `{param}` for effect `{effect}`: {reason}")]
    Effect {
        effect: String,
        param: String,
        reason: String,
    },

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("INI parse error: {0}")]
    IniParse(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for text2speech operations
pub type Result<T> = std::result::Result<T, TtsError>;

impl TtsError {
    /// Build an effect parameter error
    pub fn effect(effect: &str, param: &str, reason: impl Into<String>) -> Self {
        TtsError::Effect {
            effect: effect.to_string(),
            param: param.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<String> for TtsError {
    fn from(s: String) -> Self {
        TtsError::Other(s)
    }
}

impl From<&str> for TtsError {
    fn from(s: &str) -> Self {
        TtsError::Other(s.to_string())
    }
}

impl From<reqwest::Error> for TtsError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TtsError::Timeout(crate::speech::backends::REQUEST_TIMEOUT)
        } else {
            TtsError::Backend(format!("HTTP error: {}", e))
        }
    }
}
