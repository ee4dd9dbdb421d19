//! Festival via `text2wave`; text is piped on stdin

use super::check_exit;
use crate::phonemes::PhonemeEntry;
use crate::platform::find_executable;
use crate::speech::{SynthesisEngine, VoiceCatalog};
use crate::{Result, TtsError};
use log::{debug, error};
use serde_json::{Map, Value};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

const TEXT2WAVE: &str = "text2wave";

#[derive(Debug, Clone, Default)]
pub struct Festival;

impl Festival {
    pub fn new(_section: &Map<String, Value>) -> Result<Self> {
        Ok(Self)
    }
}

impl SynthesisEngine for Festival {
    fn name(&self) -> &str {
        "festival"
    }

    fn validate(&self) -> Result<()> {
        find_executable(&[TEXT2WAVE], "-h").map(|_| ()).ok_or_else(|| {
            TtsError::Validation(
                "Festival not installed. Run sudo apt-get install festival".to_string(),
            )
        })
    }

    /// Festival can't enumerate voices
    fn describe_voices(&self) -> Result<VoiceCatalog> {
        Ok(VoiceCatalog::new())
    }

    fn synthesize(
        &self,
        text: &str,
        _lang: &str,
        _voice: &str,
        out: &Path,
    ) -> Result<Option<Vec<PhonemeEntry>>> {
        debug!("Running {} -o {}", TEXT2WAVE, out.display());
        let mut child = Command::new(TEXT2WAVE)
            .arg("-o")
            .arg(out)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                error!("Failed to spawn {}: {}", TEXT2WAVE, e);
                TtsError::Backend(format!("Failed to start {}: {}", TEXT2WAVE, e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
        }
        check_exit(TEXT2WAVE, child.wait_with_output()?)?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_voice_enumeration() {
        let festival = Festival::new(&Map::new()).unwrap();
        assert!(festival.describe_voices().unwrap().is_empty());
        assert!(festival.ssml_tags().is_empty());
    }
}
