//! Text preprocessing: SSML filtering, phonetic spelling and chunking

pub mod chunker;
pub mod spelling;
pub mod ssml;

pub use spelling::PhoneticSpellings;

use log::debug;

/// Default upper bound on characters per synthesis call
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 400;

/// A piece of an utterance scheduled for one synthesis call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    /// Start listening once this chunk has played
    pub listen: bool,
}

/// Turns raw request text into ordered chunks for one engine
#[derive(Debug, Clone)]
pub struct SsmlProcessor {
    allowed_tags: Vec<String>,
    max_chunk_chars: usize,
    spellings: Option<PhoneticSpellings>,
}

impl SsmlProcessor {
    pub fn new(allowed_tags: Vec<String>, max_chunk_chars: usize) -> Self {
        Self {
            allowed_tags,
            max_chunk_chars,
            spellings: None,
        }
    }

    /// Enable phonetic spelling substitution
    pub fn with_spellings(mut self, spellings: PhoneticSpellings) -> Self {
        self.spellings = Some(spellings);
        self
    }

    pub fn with_max_chunk_chars(mut self, max_chunk_chars: usize) -> Self {
        self.max_chunk_chars = max_chunk_chars.max(1);
        self
    }

    pub fn allowed_tags(&self) -> &[String] {
        &self.allowed_tags
    }

    pub fn max_chunk_chars(&self) -> usize {
        self.max_chunk_chars
    }

    /// Prepare text with supported tags passed through unchanged
    pub fn prepare(&self, text: &str, listen: bool) -> Vec<Chunk> {
        self.prepare_with(text, listen, &|tag: &str| tag.to_string())
    }

    /// Filter tags, rewrite kept tags with `modify_tag`, substitute phonetic
    /// spellings and chunk
    ///
    /// Only the last chunk carries `listen`; earlier ones never do.
    pub fn prepare_with(
        &self,
        text: &str,
        listen: bool,
        modify_tag: &dyn Fn(&str) -> String,
    ) -> Vec<Chunk> {
        let mut sentence = ssml::validate_ssml(text, &self.allowed_tags, modify_tag);

        if let Some(spellings) = &self.spellings {
            sentence = spellings.apply(&sentence);
        }

        let pieces = chunker::chunk_text(&sentence, self.max_chunk_chars);
        let last = pieces.len().saturating_sub(1);
        debug!("Prepared {} chunk(s) from {} chars", pieces.len(), text.len());

        pieces
            .into_iter()
            .enumerate()
            .map(|(i, text)| Chunk {
                text,
                listen: listen && i == last,
            })
            .collect()
    }
}
