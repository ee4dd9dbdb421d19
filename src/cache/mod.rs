//! Content-addressed synthesis cache
//!
//! Audio for a chunk is stored once per `(text, voice)` under
//! `<root>/tts/{hash}{voice}.{ext}`, where `hash` is the first 128 bits of
//! the SHA-256 of the chunk text. Phonemes reported by the engine are kept
//! in a `{hash}.pho` sidecar. Entries are written to a temporary file and
//! renamed into place, so a concurrent reader never sees a partial file.
//!
//! Concurrent requests for the same key are coalesced: only one caller
//! synthesizes, the others wait for and share its result.

pub mod curate;

pub use curate::{curate_cache, curate_with_usage};

use crate::phonemes::{format_annotation, parse_annotation, PhonemeEntry};
use crate::{Result, TtsError};
use log::{debug, warn};
use once_cell::sync::OnceCell;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// Subdirectory of the cache root holding synthesized speech
pub const DOMAIN: &str = "tts";

/// Extension of phoneme sidecar files
pub const PHONEME_EXT: &str = "pho";

/// Default cache root: `<temp>/text2speech/cache`
pub fn default_cache_root() -> PathBuf {
    std::env::temp_dir().join("text2speech").join("cache")
}

/// Hex digest identifying chunk text (128 bits)
pub fn content_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest[..16].iter().map(|b| format!("{:02x}", b)).collect()
}

/// Identity of one cached artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub hash: String,
    pub voice: String,
    pub ext: String,
}

impl CacheKey {
    pub fn new(text: &str, voice: &str, ext: &str) -> Self {
        Self {
            hash: content_hash(text),
            voice: voice.to_string(),
            ext: ext.to_string(),
        }
    }

    /// `{hash}{voice}.{ext}`
    pub fn file_name(&self) -> String {
        format!("{}{}.{}", self.hash, self.voice, self.ext)
    }

    /// Sidecar name; keyed by content hash alone
    pub fn phoneme_file_name(&self) -> String {
        format!("{}.{}", self.hash, PHONEME_EXT)
    }
}

/// A synthesized artifact and its phonemes, if the engine reported any
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub path: PathBuf,
    pub phonemes: Option<Vec<PhonemeEntry>>,
}

/// Result of [`SynthesisCache::get_or_synthesize`]
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub entry: CacheEntry,
    /// False only for the caller that ran the synthesis
    pub hit: bool,
}

/// On-disk synthesis cache
#[derive(Debug)]
pub struct SynthesisCache {
    root: PathBuf,
    dir: PathBuf,
    in_flight: Mutex<HashMap<CacheKey, Arc<OnceCell<CacheEntry>>>>,
}

impl SynthesisCache {
    /// Cache rooted at `root`; entries live in `root/tts`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let dir = root.join(DOMAIN);
        Self {
            root,
            dir,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the cached audio
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Final path for a key, whether or not it exists yet
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Return the cached artifact for `(text, voice)`, synthesizing it on a
    /// miss
    ///
    /// `synthesize` receives the path to write audio to and returns the
    /// engine's phonemes, if any. It runs at most once per key across all
    /// concurrent callers. If the artifact can't be stored in the cache the
    /// synthesized file is still returned from a temporary location.
    pub fn get_or_synthesize<F>(
        &self,
        text: &str,
        voice: &str,
        ext: &str,
        synthesize: F,
    ) -> Result<Lookup>
    where
        F: FnOnce(&Path) -> Result<Option<Vec<PhonemeEntry>>>,
    {
        let key = CacheKey::new(text, voice, ext);
        let path = self.path_for(&key);

        if path.is_file() {
            debug!("TTS cache hit: {}", key.file_name());
            return Ok(Lookup {
                entry: self.load(&key, path),
                hit: true,
            });
        }

        let cell = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            in_flight.entry(key.clone()).or_default().clone()
        };

        let mut synthesized = false;
        let result = cell.get_or_try_init(|| {
            // another caller may have finished between the check and the lock
            if path.is_file() {
                return Ok(self.load(&key, path.clone()));
            }
            synthesized = true;
            self.store(&key, &path, synthesize)
        });

        {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            if in_flight.get(&key).map_or(false, |c| Arc::ptr_eq(c, &cell)) {
                in_flight.remove(&key);
            }
        }

        Ok(Lookup {
            entry: result?.clone(),
            hit: !synthesized,
        })
    }

    fn load(&self, key: &CacheKey, path: PathBuf) -> CacheEntry {
        CacheEntry {
            path,
            phonemes: self.load_phonemes(key),
        }
    }

    /// Phonemes persisted for a key's text, if any
    pub fn load_phonemes(&self, key: &CacheKey) -> Option<Vec<PhonemeEntry>> {
        let contents = fs::read_to_string(self.dir.join(key.phoneme_file_name())).ok()?;
        let phonemes = parse_annotation(&contents);
        if phonemes.is_empty() {
            None
        } else {
            Some(phonemes)
        }
    }

    fn store<F>(&self, key: &CacheKey, path: &Path, synthesize: F) -> Result<CacheEntry>
    where
        F: FnOnce(&Path) -> Result<Option<Vec<PhonemeEntry>>>,
    {
        let tmp = self.temp_file(&key.ext)?;
        debug!("TTS cache miss, synthesizing {}", key.file_name());
        let phonemes = synthesize(tmp.path())?.filter(|p| !p.is_empty());

        // sidecar first: once the audio is visible its phonemes must be too
        if let Some(phonemes) = &phonemes {
            if let Err(e) = self.save_phonemes(key, phonemes) {
                warn!("Failed to save phonemes for {}: {}", key.hash, e);
            }
        }

        match tmp.persist(path) {
            Ok(_) => {
                Ok(CacheEntry {
                    path: path.to_path_buf(),
                    phonemes,
                })
            }
            Err(e) => {
                warn!("Failed to cache {}: {}", path.display(), e.error);
                let kept = e
                    .file
                    .into_temp_path()
                    .keep()
                    .map_err(|e| TtsError::Cache(e.to_string()))?;
                Ok(CacheEntry {
                    path: kept,
                    phonemes,
                })
            }
        }
    }

    /// Scratch file in the cache directory, or the system temp directory
    /// when the cache isn't writable
    fn temp_file(&self, ext: &str) -> Result<NamedTempFile> {
        let suffix = format!(".{}", ext);
        let in_cache = fs::create_dir_all(&self.dir).and_then(|_| {
            tempfile::Builder::new()
                .prefix(".tmp-")
                .suffix(&suffix)
                .tempfile_in(&self.dir)
        });
        match in_cache {
            Ok(file) => Ok(file),
            Err(e) => {
                warn!("Cache directory {} unusable: {}", self.dir.display(), e);
                Ok(tempfile::Builder::new()
                    .prefix("text2speech-")
                    .suffix(&suffix)
                    .tempfile()?)
            }
        }
    }

    /// Persist phonemes for a key's text
    pub fn save_phonemes(&self, key: &CacheKey, phonemes: &[PhonemeEntry]) -> Result<()> {
        let mut tmp = tempfile::Builder::new()
            .prefix(".tmp-")
            .tempfile_in(&self.dir)?;
        tmp.write_all(format_annotation(phonemes).as_bytes())?;
        tmp.persist(self.dir.join(key.phoneme_file_name()))
            .map_err(|e| TtsError::Io(e.error))?;
        Ok(())
    }

    /// Remove every cached file, including nested directories
    ///
    /// Best effort: a file that can't be removed is logged and skipped.
    /// Returns the number of files removed.
    pub fn clear(&self) -> Result<usize> {
        match fs::metadata(&self.dir) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(TtsError::Cache(format!("{}: {}", self.dir.display(), e))),
        }
        let removed = clear_dir(&self.dir)?;
        debug!("Cleared {} cached file(s) from {}", removed, self.dir.display());
        Ok(removed)
    }

    /// Free disk space under the cache root if the disk is nearly full
    ///
    /// Returns the number of bytes deleted.
    pub fn curate(&self, min_free_percent: f64, min_free_disk: u64) -> Result<u64> {
        if !self.root.is_dir() {
            return Ok(0);
        }
        curate_cache(&self.root, min_free_percent, min_free_disk)
    }
}

fn clear_dir(dir: &Path) -> Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        let path = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            match clear_dir(&path) {
                Ok(n) => removed += n,
                Err(e) => warn!("Failed to clear {}: {}", path.display(), e),
            }
            if let Err(e) = fs::remove_dir(&path) {
                warn!("Failed to remove {}: {}", path.display(), e);
            }
        } else {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
    }
    Ok(removed)
}
