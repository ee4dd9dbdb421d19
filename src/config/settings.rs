//! Pipeline settings (`~/.text2speech.cfg`)

use crate::cache::default_cache_root;
use crate::text::{PhoneticSpellings, DEFAULT_MAX_CHUNK_CHARS};
use crate::{Result, TtsError};
use ini::Ini;
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Settings file name in the home directory
pub const SETTINGS_FILE: &str = ".text2speech.cfg";

/// INI-backed settings shared by every engine
///
/// Sections:
/// - `[cache]` `dir`, `min_free_percent`, `min_free_disk_mb`
/// - `[speech]` `phonetic_spelling`, `max_chunk_chars`
/// - `[spellings]` word = phonetic spelling
/// - `[phonemes]` `dictionary` (CMU format file), `transcriber` (command)
pub struct Settings {
    ini: Ini,
    path: PathBuf,
}

impl Settings {
    /// Load `~/.text2speech.cfg`, creating it with defaults if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load settings from `path`, creating it with defaults if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading settings from {:?}", path);

        let ini = if path.exists() {
            Ini::load_from_file(path)
                .map_err(|e| TtsError::IniParse(format!("Failed to load settings: {}", e)))?
        } else {
            info!("Settings file not found, creating default at {:?}", path);
            let default = Self::default_ini();
            default
                .write_to_file(path)
                .map_err(|e| TtsError::IniParse(format!("Failed to write settings: {}", e)))?;
            default
        };

        Ok(Self {
            ini,
            path: path.to_path_buf(),
        })
    }

    /// Defaults held in memory only
    pub fn defaults() -> Self {
        Self {
            ini: Self::default_ini(),
            path: Self::default_path(),
        }
    }

    pub fn save(&self) -> Result<()> {
        debug!("Saving settings to {:?}", self.path);
        self.ini
            .write_to_file(&self.path)
            .map_err(|e| TtsError::Config(format!("Failed to save settings: {}", e)))
    }

    fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(SETTINGS_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn default_ini() -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("cache"))
            .set("dir", "")
            .set("min_free_percent", "5.0")
            .set("min_free_disk_mb", "50");

        ini.with_section(Some("speech"))
            .set("phonetic_spelling", "true")
            .set("max_chunk_chars", DEFAULT_MAX_CHUNK_CHARS.to_string());

        let mut spellings = ini.with_section(Some("spellings"));
        for (word, spelling) in crate::text::spelling::DEFAULT_SPELLINGS.iter() {
            spellings.set(*word, *spelling);
        }

        ini.with_section(Some("phonemes"))
            .set("dictionary", "")
            .set("transcriber", "");

        ini
    }

    pub fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    pub fn get_string(&self, section: &str, key: &str, default: &str) -> String {
        self.ini
            .get_from(Some(section), key)
            .unwrap_or(default)
            .to_string()
    }

    pub fn get_float(&self, section: &str, key: &str, default: f64) -> f64 {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    pub fn get_usize(&self, section: &str, key: &str, default: usize) -> usize {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.ini.with_section(Some(section)).set(key, value);
    }

    fn get_path(&self, section: &str, key: &str) -> Option<PathBuf> {
        self.ini
            .get_from(Some(section), key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    /// Cache root; the system temp directory unless configured
    pub fn cache_dir(&self) -> PathBuf {
        self.get_path("cache", "dir").unwrap_or_else(default_cache_root)
    }

    /// Free-space percentage below which the cache is curated
    pub fn min_free_percent(&self) -> f64 {
        self.get_float("cache", "min_free_percent", 5.0)
    }

    /// Free-space floor in bytes (configured in MB)
    pub fn min_free_disk_bytes(&self) -> u64 {
        let mb = self.get_float("cache", "min_free_disk_mb", 50.0).max(0.0);
        (mb * 1024.0 * 1024.0) as u64
    }

    pub fn phonetic_spelling(&self) -> bool {
        self.get_bool("speech", "phonetic_spelling", true)
    }

    pub fn max_chunk_chars(&self) -> usize {
        self.get_usize("speech", "max_chunk_chars", DEFAULT_MAX_CHUNK_CHARS)
            .max(1)
    }

    /// Phonetic spellings from `[spellings]`, or the built-in set when the
    /// section is absent
    pub fn spellings(&self) -> PhoneticSpellings {
        match self.ini.section(Some("spellings")) {
            Some(section) => section.iter().collect(),
            None => PhoneticSpellings::with_defaults(),
        }
    }

    /// Pronunciation dictionary file, if configured
    pub fn dictionary(&self) -> Option<PathBuf> {
        self.get_path("phonemes", "dictionary")
    }

    /// External phonetic transcriber command line, if configured
    pub fn transcriber(&self) -> Option<String> {
        let command = self.get_string("phonemes", "transcriber", "");
        let command = command.trim();
        if command.is_empty() {
            None
        } else {
            Some(command.to_string())
        }
    }
}
