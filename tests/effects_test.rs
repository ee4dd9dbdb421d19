//! Voice effects chain tests
//!
//! Argument building is checked directly; execution is checked against a
//! stand-in `sox` script so no real audio tools are needed.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use text2speech::effects::EffectChain;
use text2speech::TtsError;

fn effects(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("effects must be an object"),
    }
}

/// Shell script that answers the probe and copies input to output
#[cfg(unix)]
fn fake_sox(dir: &Path, exit_code: i32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-sox");
    let script = format!(
        "#!/bin/sh\n\
         [ \"$1\" = --version ] && exit 0\n\
         if [ {code} -ne 0 ]; then echo 'sox FAIL' >&2; exit {code}; fi\n\
         cp \"$1\" \"$2\"\n",
        code = exit_code
    );
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[test]
fn test_randomized_chorus_is_reproducible_with_seed() {
    let chain = EffectChain::from_config(&effects(json!({"chorus": {"n_voices": 3}}))).unwrap();

    let a = chain.build_args_with(&mut StdRng::seed_from_u64(7)).unwrap();
    let b = chain.build_args_with(&mut StdRng::seed_from_u64(7)).unwrap();
    assert_eq!(a, b);

    // name, gain in/out, then five values per voice
    assert_eq!(a.len(), 3 + 3 * 5);
    assert_eq!(a[0], "chorus");
    for voice in a[3..].chunks(5) {
        let delay: f64 = voice[0].parse().unwrap();
        assert!((40.0..60.0).contains(&delay));
        assert!(voice[4] == "-s" || voice[4] == "-t");
    }
}

#[test]
fn test_full_chain_order() {
    let chain = EffectChain::from_config(&effects(json!({
        "highpass": {"frequency": 300},
        "tempo": {"factor": 0.9},
        "echo": {"n_echos": 2},
        "loudness": {},
    })))
    .unwrap();

    let args = chain.build_args().unwrap();
    let names: Vec<_> = args
        .iter()
        .filter(|a| a.chars().all(|c| c.is_ascii_lowercase()))
        .cloned()
        .collect();
    assert_eq!(names, vec!["highpass", "tempo", "echo", "loudness"]);
}

#[test]
fn test_invalid_parameter_names_effect_and_param() {
    let err = EffectChain::from_config(&effects(json!({
        "reverb": {"reverberance": 250}
    })))
    .unwrap_err();

    match err {
        TtsError::Effect { effect, param, .. } => {
            assert_eq!(effect, "reverb");
            assert_eq!(param, "reverberance");
        }
        other => panic!("expected Effect error, got {:?}", other),
    }
}

#[cfg(unix)]
#[test]
fn test_apply_replaces_output() {
    let dir = TempDir::new().unwrap();
    let sox = fake_sox(dir.path(), 0);
    let input = dir.path().join("in.wav");
    let output = dir.path().join("out.wav");
    fs::write(&input, b"RIFF-input").unwrap();
    fs::write(&output, b"stale").unwrap();

    let chain = EffectChain::from_config(&effects(json!({"reverse": {}})))
        .unwrap()
        .with_sox(sox.display().to_string());
    let result = chain.apply(&input, &output).unwrap();

    assert_eq!(result, output);
    assert_eq!(fs::read(&output).unwrap(), b"RIFF-input");
    // the input is never touched
    assert_eq!(fs::read(&input).unwrap(), b"RIFF-input");
}

#[cfg(unix)]
#[test]
fn test_failed_run_leaves_output_alone() {
    let dir = TempDir::new().unwrap();
    let sox = fake_sox(dir.path(), 2);
    let input = dir.path().join("in.wav");
    let output = dir.path().join("out.wav");
    fs::write(&input, b"RIFF").unwrap();

    let chain = EffectChain::from_config(&effects(json!({"reverse": {}})))
        .unwrap()
        .with_sox(sox.display().to_string());
    let err = chain.apply(&input, &output).unwrap_err();

    assert!(matches!(err, TtsError::Backend(ref m) if m.contains("FAIL")));
    assert!(!output.exists());
    // no scratch files left behind
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(".fx-"))
        .collect();
    assert!(leftovers.is_empty());
}
