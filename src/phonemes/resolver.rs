//! Phoneme resolution with ordered fallbacks
//!
//! Sources are tried in order, each one allowed to come up empty:
//! 1. phonemes the engine reported while synthesizing
//! 2. an external transcriber for the target language
//! 3. the pronunciation dictionary (English only)
//! 4. the letter-cluster guesser (English only)
//!
//! Steps 3 and 4 work per word; a phrase only resolves if every word does.

use super::dictionary::PronunciationDictionary;
use super::guess::guess_word;
use super::{parse_annotation, PhonemeEntry, PAUSE};
use crate::text::ssml::remove_ssml;
use log::{debug, warn};
use std::process::{Command, Stdio};

/// Duration assigned to each phoneme when the source has no timing
pub const DEFAULT_PHONEME_DURATION: f64 = 0.1;

/// Duration of the pause inserted between words
pub const DEFAULT_PAUSE_DURATION: f64 = 0.2;

/// Phonetic transcription service for a language
pub trait Transcriber: Send + Sync {
    /// Transcribe `text`, or `None` if the language or text isn't handled
    fn transcribe(&self, text: &str, lang: &str) -> Option<Vec<PhonemeEntry>>;
}

/// Transcriber backed by an external program
///
/// The program is run as `<program> <args...> <text>` and must print
/// either `symbol:duration` pairs or bare whitespace-separated symbols.
#[derive(Debug, Clone)]
pub struct CommandTranscriber {
    program: String,
    args: Vec<String>,
    /// Language prefixes the program understands; empty means all
    langs: Vec<String>,
}

impl CommandTranscriber {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            langs: Vec::new(),
        }
    }

    /// Parse a command line such as `g2p --arpabet`
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    pub fn with_langs(mut self, langs: Vec<String>) -> Self {
        self.langs = langs;
        self
    }

    fn supports(&self, lang: &str) -> bool {
        let lang = lang.to_lowercase();
        self.langs.is_empty() || self.langs.iter().any(|l| lang.starts_with(&l.to_lowercase()))
    }
}

impl Transcriber for CommandTranscriber {
    fn transcribe(&self, text: &str, lang: &str) -> Option<Vec<PhonemeEntry>> {
        if !self.supports(lang) {
            return None;
        }

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output();

        let output = match output {
            Ok(output) if output.status.success() => output,
            Ok(output) => {
                warn!("{} exited with {}", self.program, output.status);
                return None;
            }
            Err(e) => {
                warn!("Failed to run transcriber {}: {}", self.program, e);
                return None;
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let phonemes = if stdout.contains(':') {
            parse_annotation(&stdout)
        } else {
            stdout
                .split_whitespace()
                .map(|symbol| PhonemeEntry::new(symbol, DEFAULT_PHONEME_DURATION))
                .collect()
        };

        if phonemes.is_empty() {
            None
        } else {
            Some(phonemes)
        }
    }
}

/// Derives phoneme sequences for utterances
pub struct PhonemeResolver {
    transcriber: Option<Box<dyn Transcriber>>,
    dictionary: PronunciationDictionary,
    phoneme_duration: f64,
    pause_duration: f64,
}

impl PhonemeResolver {
    pub fn new(dictionary: PronunciationDictionary) -> Self {
        Self {
            transcriber: None,
            dictionary,
            phoneme_duration: DEFAULT_PHONEME_DURATION,
            pause_duration: DEFAULT_PAUSE_DURATION,
        }
    }

    pub fn with_transcriber(mut self, transcriber: Box<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    pub fn with_durations(mut self, phoneme: f64, pause: f64) -> Self {
        self.phoneme_duration = phoneme;
        self.pause_duration = pause;
        self
    }

    /// Pick the engine's phonemes if it reported any, else resolve `text`
    pub fn resolve_with(
        &self,
        engine_phonemes: Option<Vec<PhonemeEntry>>,
        text: &str,
        lang: &str,
    ) -> Option<Vec<PhonemeEntry>> {
        match engine_phonemes {
            Some(phonemes) if !phonemes.is_empty() => Some(phonemes),
            _ => self.resolve(text, lang),
        }
    }

    /// Resolve phonemes for `text` without engine help
    pub fn resolve(&self, text: &str, lang: &str) -> Option<Vec<PhonemeEntry>> {
        let text = remove_ssml(text);

        if let Some(phonemes) = self
            .transcriber
            .as_ref()
            .and_then(|t| t.transcribe(&text, lang))
        {
            debug!("Phonemes from transcriber: {} entries", phonemes.len());
            return Some(phonemes);
        }

        if !lang.to_lowercase().starts_with("en") {
            debug!("No phoneme fallback for language {}", lang);
            return None;
        }

        let words = words(&text);
        if words.is_empty() {
            return None;
        }

        let mut phonemes = Vec::new();
        for (i, word) in words.iter().enumerate() {
            if i > 0 {
                phonemes.push(PhonemeEntry::new(PAUSE, self.pause_duration));
            }
            let phones = self.resolve_word(word)?;
            phonemes.extend(
                phones
                    .into_iter()
                    .map(|p| PhonemeEntry::new(p, self.phoneme_duration)),
            );
        }
        Some(phonemes)
    }

    fn resolve_word(&self, word: &str) -> Option<Vec<String>> {
        if let Some(phones) = self.dictionary.lookup(word) {
            return Some(phones.to_vec());
        }
        let guessed = guess_word(word);
        if guessed.is_none() {
            debug!("Could not guess phonemes for {:?}", word);
        }
        guessed.map(|phones| phones.into_iter().map(str::to_string).collect())
    }
}

impl Default for PhonemeResolver {
    fn default() -> Self {
        Self::new(PronunciationDictionary::new())
    }
}

/// Split text into words, dropping surrounding punctuation
fn words(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\''))
        .map(|w| w.trim_matches('\''))
        .filter(|w| !w.is_empty())
        .collect()
}
