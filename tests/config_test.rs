//! Configuration loading tests
//!
//! Tests that pipeline settings and engine configuration load correctly
//! and provide expected default values

use std::fs;
use tempfile::TempDir;
use text2speech::config::{Settings, TtsConfig};
use text2speech::TtsError;

#[test]
fn test_settings_created_with_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("text2speech.cfg");

    let settings = Settings::load_from(&path).expect("Failed to load settings");

    // Missing file is written out with defaults
    assert!(path.exists());
    assert_eq!(settings.path(), path.as_path());
    assert_eq!(settings.max_chunk_chars(), 400);
    assert!(settings.phonetic_spelling());

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("[cache]"));
    assert!(written.contains("[spellings]"));
}

#[test]
fn test_settings_round_trip_through_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("text2speech.cfg");

    let mut settings = Settings::load_from(&path).unwrap();
    settings.set("cache", "dir", "/tmp/tts-elsewhere");
    settings.set("speech", "phonetic_spelling", "false");
    settings.save().unwrap();

    let reloaded = Settings::load_from(&path).unwrap();
    assert_eq!(reloaded.cache_dir().to_str(), Some("/tmp/tts-elsewhere"));
    assert!(!reloaded.phonetic_spelling());
}

#[test]
fn test_user_spellings_replace_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("text2speech.cfg");
    fs::write(&path, "[spellings]\nnginx = engine x\n").unwrap();

    let settings = Settings::load_from(&path).unwrap();
    let spellings = settings.spellings();
    assert_eq!(spellings.get("NGINX"), Some("engine x"));
    assert_eq!(spellings.len(), 1);
}

#[test]
fn test_engine_config_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tts.json");
    fs::write(
        &path,
        r#"{
            "module": "marytts",
            "marytts": {"url": "http://localhost:59125", "lang": "en-gb"},
            "effects": {"reverb": {"reverberance": 40}, "gain": {"gain": -3}}
        }"#,
    )
    .unwrap();

    let config = TtsConfig::load(&path).expect("Failed to load engine config");
    assert_eq!(config.module, "marytts");
    assert_eq!(config.lang().unwrap(), "en-gb");
    assert_eq!(config.voice().unwrap(), None);
    assert_eq!(
        config.section().unwrap()["url"].as_str(),
        Some("http://localhost:59125")
    );

    let effects: Vec<_> = config.effects().unwrap().keys().cloned().collect();
    assert_eq!(effects, vec!["reverb", "gain"]);
}

#[test]
fn test_engine_config_errors() {
    let dir = TempDir::new().unwrap();

    let missing = TtsConfig::load(&dir.path().join("nope.json"));
    assert!(matches!(missing, Err(TtsError::Config(_))));

    let path = dir.path().join("broken.json");
    fs::write(&path, "{ module: espeak").unwrap();
    assert!(matches!(TtsConfig::load(&path), Err(TtsError::Json(_))));
}
