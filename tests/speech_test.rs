//! Integration tests for engine selection and voice catalogs
//!
//! Local engines may not be installed where these run, so only the
//! behaviour that doesn't depend on an executable or a server is checked.

use serde_json::{json, Map, Value};
use std::net::TcpListener;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use text2speech::speech::backends::marytts::MaryTts;
use text2speech::speech::SynthesisEngine;
use text2speech::speech::{create_engine, VoiceCatalog, MODULES};
use text2speech::TtsError;

fn section(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("section must be an object"),
    }
}

#[test]
fn test_unknown_module_lists_choices() {
    let err = create_engine("responsive_voice", &Map::new()).err().unwrap();
    match err {
        TtsError::Config(msg) => {
            for module in MODULES {
                assert!(msg.contains(module), "{} missing from {:?}", module, msg);
            }
        }
        other => panic!("expected Config error, got {:?}", other),
    }
}

#[test]
fn test_missing_executable_fails_validation() {
    let config = section(json!({"bin": "/nonexistent/espeak"}));
    let err = create_engine("espeak", &config).err().unwrap();
    assert!(matches!(err, TtsError::Validation(_)));
}

#[test]
fn test_bad_option_type_is_config_error() {
    let config = section(json!({"duration_stretch": "slow"}));
    let err = create_engine("mimic", &config).err().unwrap();
    assert!(matches!(err, TtsError::Config(_)));
}

#[test]
fn test_voicerss_engine() {
    let engine = create_engine("voicerss", &section(json!({"key": "abc123"})))
        .expect("VoiceRSS with a key should validate");

    assert_eq!(engine.name(), "voicerss");
    assert_eq!(engine.audio_ext(), "mp3");

    let voices = engine.describe_voices().unwrap();
    assert!(voices.get("en-us").is_some());
    // region fallback never applies to VoiceRSS's fully qualified table
    assert!(voices.get("xx-yy").is_none());
    assert_eq!(
        engine.default_voice("en-gb").as_deref(),
        Some("English (Great Britain)")
    );
}

#[test]
fn test_catalog_region_fallback() {
    let catalog: VoiceCatalog = [("en", vec!["m1", "f1"]), ("pt-br", vec!["f2"])]
        .into_iter()
        .collect();

    // en-au isn't listed, but its base language is
    assert_eq!(catalog.validate("en-AU", "f1").unwrap(), "en");
    // the reverse never happens: pt doesn't fall forward to pt-br
    assert!(catalog.validate("pt", "f2").is_err());
    assert!(catalog.validate("en-us", "f2").is_err());
}

#[test]
fn test_empty_catalog_accepts_anything() {
    let catalog = VoiceCatalog::new();
    assert_eq!(catalog.validate("ja_JP", "anyone").unwrap(), "ja-jp");
}

#[test]
fn test_unresponsive_server_times_out() {
    // accepts connections but never answers
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming().flatten() {
            held.push(stream);
        }
    });

    let engine = MaryTts::new(&section(json!({"url": format!("http://{}", addr)})))
        .unwrap()
        .with_timeout(Duration::from_millis(300))
        .unwrap();
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out.wav");

    let started = Instant::now();
    let err = engine
        .synthesize("Hello.", "en-us", "cmu-bdl-hsmm", &out)
        .unwrap_err();
    assert!(matches!(err, TtsError::Timeout(_)), "got {:?}", err);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(!out.exists());
}
