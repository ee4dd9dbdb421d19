//! End-to-end pipeline tests
//!
//! A scripted engine stands in for a real backend so chunking, caching,
//! phoneme fallback, visemes, effects and error propagation can be checked
//! without any speech software installed.

use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use text2speech::cache::SynthesisCache;
use text2speech::effects::EffectChain;
use text2speech::phonemes::PhonemeEntry;
use text2speech::speech::{SynthesisEngine, VoiceCatalog};
use text2speech::{RequestState, Result, SynthesisPipeline, TtsError, Utterance};

/// Engine that writes the text it was given and reports what it's told to
#[derive(Default)]
struct ScriptedEngine {
    calls: Arc<AtomicUsize>,
    texts: Arc<Mutex<Vec<String>>>,
    phonemes: Option<Vec<PhonemeEntry>>,
    fail: bool,
    /// 1-based call that fails, for failures partway through an utterance
    fail_on_call: Option<usize>,
}

impl SynthesisEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    fn ssml_tags(&self) -> Vec<String> {
        vec!["speak".to_string(), "prosody".to_string()]
    }

    fn modify_tag(&self, tag: &str) -> String {
        tag.replace("rate=", "speed=")
    }

    fn max_chunk_chars(&self) -> usize {
        40
    }

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn describe_voices(&self) -> Result<VoiceCatalog> {
        Ok([("en", vec!["kal", "awb"]), ("es-es", vec!["maria"])]
            .into_iter()
            .collect())
    }

    fn synthesize(
        &self,
        text: &str,
        _lang: &str,
        _voice: &str,
        out: &Path,
    ) -> Result<Option<Vec<PhonemeEntry>>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.texts.lock().unwrap().push(text.to_string());
        if self.fail || self.fail_on_call == Some(call) {
            return Err(TtsError::Backend("engine crashed".to_string()));
        }
        fs::write(out, text)?;
        Ok(self.phonemes.clone())
    }
}

fn pipeline(dir: &TempDir, engine: ScriptedEngine) -> SynthesisPipeline {
    let cache = SynthesisCache::new(dir.path());
    SynthesisPipeline::new(Box::new(engine), "en-us", Some("kal"), cache)
        .expect("pipeline should build")
}

#[test]
fn test_chunks_queued_in_order_with_listen_on_last() {
    let dir = TempDir::new().unwrap();
    let texts = Arc::new(Mutex::new(Vec::new()));
    let engine = ScriptedEngine {
        texts: texts.clone(),
        ..Default::default()
    };
    let pipeline = pipeline(&dir, engine);

    let utterance = pipeline.utterance(
        "The first sentence is here. The second sentence is here. And the third one is here.",
    );
    let queued = pipeline.execute(&utterance, Some("req-1"), true).unwrap();
    assert_eq!(queued, 3);

    let items: Vec<_> = std::iter::from_fn(|| pipeline.deliver()).collect();
    assert_eq!(items.len(), 3);
    assert_eq!(
        items.iter().map(|i| i.listen).collect::<Vec<_>>(),
        vec![false, false, true]
    );
    for item in &items {
        assert_eq!(item.ident.as_deref(), Some("req-1"));
        assert_eq!(item.audio_ext, "wav");
    }

    // playback order matches text order
    let played: Vec<_> = items
        .iter()
        .map(|i| fs::read_to_string(&i.path).unwrap())
        .collect();
    assert_eq!(played, *texts.lock().unwrap());
    assert_eq!(played[0], "The first sentence is here.");
}

#[test]
fn test_repeat_request_served_from_cache() {
    let dir = TempDir::new().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let states = Arc::new(Mutex::new(Vec::new()));
    let seen = states.clone();
    let engine = ScriptedEngine {
        calls: calls.clone(),
        ..Default::default()
    };
    let pipeline = pipeline(&dir, engine)
        .with_observer(Box::new(move |s| seen.lock().unwrap().push(s)));

    let utterance = pipeline.utterance("Hello world.");
    let first = pipeline.synthesize(&utterance, None, false).unwrap();
    let second = pipeline.synthesize(&utterance, None, false).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first[0].path, second[0].path);
    let states = states.lock().unwrap();
    assert_eq!(states.iter().filter(|s| **s == RequestState::Synthesizing).count(), 1);
    assert_eq!(states.iter().filter(|s| **s == RequestState::CacheHit).count(), 1);
}

#[test]
fn test_engine_phonemes_become_visemes() {
    let dir = TempDir::new().unwrap();
    let engine = ScriptedEngine {
        phonemes: Some(vec![
            PhonemeEntry::new("m", 0.1),
            PhonemeEntry::new("uw", 0.2),
            PhonemeEntry::new("zz", 0.05),
        ]),
        ..Default::default()
    };
    let pipeline = pipeline(&dir, engine);

    let items = pipeline
        .synthesize(&pipeline.utterance("Moo."), None, false)
        .unwrap();
    let visemes = items[0].visemes.as_ref().expect("visemes expected");
    let codes: Vec<_> = visemes.iter().map(|v| v.code).collect();
    // unknown symbols fall back to the closed mouth shape
    assert_eq!(codes, vec!["4", "2", "4"]);
    assert_eq!(visemes[1].duration, 0.2);
}

#[test]
fn test_phonemes_resolved_when_engine_reports_none() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline(&dir, ScriptedEngine::default());

    let items = pipeline
        .synthesize(&pipeline.utterance("Hi."), None, false)
        .unwrap();
    let codes: Vec<_> = items[0]
        .visemes
        .as_ref()
        .expect("dictionary fallback expected")
        .iter()
        .map(|v| v.code)
        .collect();
    // HH AY1
    assert_eq!(codes, vec!["0", "0"]);
}

#[test]
fn test_no_phonemes_for_unsupported_language() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline(&dir, ScriptedEngine::default());

    let utterance = Utterance::new("Hola.", "es-ES", "maria");
    let items = pipeline.synthesize(&utterance, None, false).unwrap();
    assert_eq!(items.len(), 1);
    assert!(items[0].visemes.is_none());
}

#[test]
fn test_unsupported_tags_stripped_and_kept_tags_rewritten() {
    let dir = TempDir::new().unwrap();
    let texts = Arc::new(Mutex::new(Vec::new()));
    let engine = ScriptedEngine {
        texts: texts.clone(),
        ..Default::default()
    };
    let pipeline = pipeline(&dir, engine);

    pipeline
        .synthesize(
            &pipeline.utterance("<prosody rate=\"fast\">Go <b>now</b></prosody>"),
            None,
            false,
        )
        .unwrap();
    assert_eq!(
        texts.lock().unwrap()[0],
        "<prosody speed=\"fast\">Go now</prosody>"
    );
}

#[test]
fn test_invalid_voice_rejected_before_synthesis() {
    let dir = TempDir::new().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let engine = ScriptedEngine {
        calls: calls.clone(),
        ..Default::default()
    };
    let pipeline = pipeline(&dir, engine);

    let err = pipeline
        .synthesize(&Utterance::new("Hi.", "en-us", "maria"), None, false)
        .unwrap_err();
    assert!(matches!(err, TtsError::Config(_)));

    let err = pipeline
        .synthesize(&Utterance::new("Hi.", "fr-fr", "kal"), None, false)
        .unwrap_err();
    assert!(matches!(err, TtsError::Config(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_invalid_voice_rejected_at_construction() {
    let dir = TempDir::new().unwrap();
    let cache = SynthesisCache::new(dir.path());
    let result = SynthesisPipeline::new(
        Box::new(ScriptedEngine::default()),
        "en-us",
        Some("nobody"),
        cache,
    );
    assert!(matches!(result, Err(TtsError::Config(_))));
}

#[test]
fn test_backend_failure_propagates_and_caches_nothing() {
    let dir = TempDir::new().unwrap();
    let states = Arc::new(Mutex::new(Vec::new()));
    let seen = states.clone();
    let engine = ScriptedEngine {
        fail: true,
        ..Default::default()
    };
    let pipeline = pipeline(&dir, engine)
        .with_observer(Box::new(move |s| seen.lock().unwrap().push(s)));

    let utterance = pipeline.utterance("Doomed.");
    let err = pipeline.execute(&utterance, None, false).unwrap_err();
    assert!(matches!(err, TtsError::Backend(_)));
    assert!(pipeline.queue().is_empty());
    assert_eq!(states.lock().unwrap().last(), Some(&RequestState::Failed));

    let cached: Vec<PathBuf> = fs::read_dir(pipeline.cache().dir())
        .map(|d| d.filter_map(|e| e.ok()).map(|e| e.path()).collect())
        .unwrap_or_default();
    assert!(
        cached
            .iter()
            .all(|p| !p.extension().map_or(false, |e| e == "wav")),
        "failed synthesis left {:?}",
        cached
    );
}

#[test]
fn test_chunks_before_a_failure_stay_queued() {
    let dir = TempDir::new().unwrap();
    let states = Arc::new(Mutex::new(Vec::new()));
    let seen = states.clone();
    let calls = Arc::new(AtomicUsize::new(0));
    let engine = ScriptedEngine {
        calls: calls.clone(),
        fail_on_call: Some(2),
        ..Default::default()
    };
    let pipeline = pipeline(&dir, engine)
        .with_max_chunk_chars(10)
        .with_observer(Box::new(move |s| seen.lock().unwrap().push(s)));

    let utterance = pipeline.utterance("One two. Three four.");
    let err = pipeline.execute(&utterance, None, false).unwrap_err();
    assert!(matches!(err, TtsError::Backend(_)));

    // the first chunk was queued before the second was attempted
    assert_eq!(pipeline.queue().len(), 1);
    let item = pipeline.deliver().unwrap();
    assert_eq!(fs::read_to_string(&item.path).unwrap(), "One two.");

    // nothing after the failure was attempted
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    let states = states.lock().unwrap();
    let queued = states.iter().position(|s| *s == RequestState::Queued).unwrap();
    let synthesizing: Vec<_> = states
        .iter()
        .enumerate()
        .filter(|(_, s)| **s == RequestState::Synthesizing)
        .map(|(i, _)| i)
        .collect();
    assert!(queued < synthesizing[1]);
    assert_eq!(states.last(), Some(&RequestState::Failed));
}

#[test]
fn test_bad_effect_parameter_is_rejected() {
    let effects = json!({"pitch": {"n_semitones": 1}, "tremolo": {"speed": -4}});
    let err = EffectChain::from_config(effects.as_object().unwrap()).unwrap_err();
    match err {
        TtsError::Effect { effect, param, .. } => {
            assert_eq!(effect, "tremolo");
            assert_eq!(param, "speed");
        }
        other => panic!("expected Effect error, got {:?}", other),
    }
}

#[cfg(unix)]
#[test]
fn test_effects_applied_to_copy_not_cache_entry() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let sox = dir.path().join("fake-sox");
    fs::write(
        &sox,
        "#!/bin/sh\n[ \"$1\" = --version ] && exit 0\n{ cat \"$1\"; printf ' +fx'; } > \"$2\"\n",
    )
    .unwrap();
    fs::set_permissions(&sox, fs::Permissions::from_mode(0o755)).unwrap();

    let effects = EffectChain::from_config(json!({"reverse": {}}).as_object().unwrap())
        .unwrap()
        .with_sox(sox.display().to_string());
    let cache_dir = dir.path().join("cache");
    let pipeline = SynthesisPipeline::new(
        Box::new(ScriptedEngine::default()),
        "en",
        Some("awb"),
        SynthesisCache::new(&cache_dir),
    )
    .unwrap()
    .with_effects(effects)
    .unwrap();

    let items = pipeline
        .synthesize(&pipeline.utterance("Echo."), None, false)
        .unwrap();
    let processed = &items[0].path;
    assert!(processed.starts_with(pipeline.cache().dir().join("fx")));
    assert_eq!(fs::read_to_string(processed).unwrap(), "Echo. +fx");

    // the cached original is untouched
    let original = pipeline
        .cache()
        .path_for(&text2speech::cache::CacheKey::new("Echo.", "awb", "wav"));
    assert_eq!(fs::read_to_string(original).unwrap(), "Echo.");

    // clearing handles the nested effects directory
    assert!(pipeline.clear_cache().unwrap() >= 2);
    assert!(!processed.exists());
}

#[test]
fn test_effects_need_sox() {
    let dir = TempDir::new().unwrap();
    let effects = EffectChain::from_config(json!({"reverse": {}}).as_object().unwrap())
        .unwrap()
        .with_sox("/nonexistent/sox");
    let result = pipeline(&dir, ScriptedEngine::default()).with_effects(effects);
    assert!(matches!(result, Err(TtsError::Validation(_))));
}
