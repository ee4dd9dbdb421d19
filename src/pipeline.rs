//! Synthesis request pipeline
//!
//! Text goes through SSML filtering, phonetic spelling and chunking; each
//! chunk is looked up in the cache and synthesized on a miss, gets phonemes
//! (from the engine or the resolver) and visemes, has the voice effects
//! applied and is queued for playback. Chunks of one utterance are handled
//! strictly in order.

use crate::cache::SynthesisCache;
use crate::config::{Settings, TtsConfig};
use crate::effects::EffectChain;
use crate::phonemes::dictionary::PronunciationDictionary;
use crate::phonemes::{map_visemes, CommandTranscriber, PhonemeResolver};
use crate::platform::find_executable;
use crate::speech::voices::normalize_lang;
use crate::speech::{create_engine, OutputItem, OutputQueue, SynthesisEngine, VoiceCatalog};
use crate::text::{Chunk, PhoneticSpellings, SsmlProcessor};
use crate::{Result, TtsError};
use log::{debug, error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Subdirectory of the cache directory holding effect-processed copies
pub const FX_DIR: &str = "fx";

/// Lifecycle of one chunk of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestState {
    Received,
    Validated,
    CacheCheck,
    CacheHit,
    Synthesizing,
    PhonemesResolved,
    EffectsApplied,
    Queued,
    Delivered,
    Failed,
}

/// Callback told about every state a request passes through
pub type StateObserver = Box<dyn Fn(RequestState) + Send + Sync>;

/// Text to speak with a target language and voice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    text: String,
    lang: String,
    voice: String,
}

impl Utterance {
    pub fn new(text: impl Into<String>, lang: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            lang: lang.into(),
            voice: voice.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }
}

/// Orchestrates preprocessing, caching, synthesis, phonemes and effects
/// for one engine
pub struct SynthesisPipeline {
    engine: Box<dyn SynthesisEngine>,
    cache: SynthesisCache,
    processor: SsmlProcessor,
    resolver: PhonemeResolver,
    effects: EffectChain,
    queue: OutputQueue,
    catalog: VoiceCatalog,
    lang: String,
    voice: String,
    observer: Option<StateObserver>,
}

impl SynthesisPipeline {
    /// Pipeline over `engine`, validating `lang`/`voice` against the
    /// engine's voices
    ///
    /// Without a voice the engine's default for `lang` is used.
    pub fn new(
        engine: Box<dyn SynthesisEngine>,
        lang: &str,
        voice: Option<&str>,
        cache: SynthesisCache,
    ) -> Result<Self> {
        let catalog = engine.describe_voices()?;
        let voice = pick_voice(engine.as_ref(), lang, voice, None);
        catalog.validate(lang, &voice)?;
        let lang = normalize_lang(lang);
        let processor = SsmlProcessor::new(engine.ssml_tags(), engine.max_chunk_chars());

        info!(
            "{} pipeline ready: lang={} voice={} cache={}",
            engine.name(),
            lang,
            voice,
            cache.dir().display()
        );

        Ok(Self {
            engine,
            cache,
            processor,
            resolver: PhonemeResolver::default(),
            effects: EffectChain::default(),
            queue: OutputQueue::new(),
            catalog,
            lang,
            voice,
            observer: None,
        })
    }

    /// Build engine, cache, effects and phoneme resolution from
    /// configuration
    pub fn from_config(config: &TtsConfig, settings: &Settings) -> Result<Self> {
        let engine = create_engine(&config.module, &config.section()?)?;
        let lang = config.lang()?;
        let voice = config.voice()?;

        let cache = SynthesisCache::new(settings.cache_dir());
        match cache.curate(settings.min_free_percent(), settings.min_free_disk_bytes()) {
            Ok(0) => {}
            Ok(freed) => info!("Freed {} bytes from the cache", freed),
            Err(e) => warn!("Cache curation failed: {}", e),
        }

        let effects = EffectChain::from_config(&config.effects()?)?;

        let dictionary = match settings.dictionary() {
            Some(path) => PronunciationDictionary::load(&path)?,
            None => PronunciationDictionary::new(),
        };
        let mut resolver = PhonemeResolver::new(dictionary);
        if let Some(command) = settings.transcriber() {
            if let Some(transcriber) = CommandTranscriber::from_command_line(&command) {
                resolver = resolver.with_transcriber(Box::new(transcriber));
            }
        }

        let mut pipeline = Self::new(engine, &lang, voice.as_deref(), cache)?
            .with_effects(effects)?
            .with_resolver(resolver)
            .with_max_chunk_chars(settings.max_chunk_chars());
        if settings.phonetic_spelling() {
            pipeline = pipeline.with_spellings(settings.spellings());
        }
        Ok(pipeline)
    }

    /// Apply `effects` to every synthesized chunk
    ///
    /// Fails if the chain is non-empty and sox isn't available.
    pub fn with_effects(mut self, effects: EffectChain) -> Result<Self> {
        if !effects.is_empty() && find_executable(&[effects.sox()], "--version").is_none() {
            return Err(TtsError::Validation(format!(
                "Voice effects need {}. Run: sudo apt-get install sox",
                effects.sox()
            )));
        }
        self.effects = effects;
        Ok(self)
    }

    pub fn with_resolver(mut self, resolver: PhonemeResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_spellings(mut self, spellings: PhoneticSpellings) -> Self {
        self.processor = self.processor.with_spellings(spellings);
        self
    }

    /// Cap chunk size below the engine's own limit
    pub fn with_max_chunk_chars(mut self, max_chunk_chars: usize) -> Self {
        let max = max_chunk_chars.min(self.engine.max_chunk_chars());
        self.processor = self.processor.with_max_chunk_chars(max);
        self
    }

    pub fn with_observer(mut self, observer: StateObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn engine(&self) -> &dyn SynthesisEngine {
        self.engine.as_ref()
    }

    pub fn cache(&self) -> &SynthesisCache {
        &self.cache
    }

    pub fn queue(&self) -> &OutputQueue {
        &self.queue
    }

    pub fn voices(&self) -> &VoiceCatalog {
        &self.catalog
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }

    /// Utterance in the pipeline's current language and voice
    pub fn utterance(&self, text: impl Into<String>) -> Utterance {
        Utterance::new(text, self.lang.clone(), self.voice.clone())
    }

    /// Switch language and voice, re-reading the engine's voices
    pub fn reconfigure(&mut self, lang: &str, voice: Option<&str>) -> Result<()> {
        let catalog = self.engine.describe_voices()?;
        let voice = pick_voice(self.engine.as_ref(), lang, voice, Some(&self.voice));
        catalog.validate(lang, &voice)?;
        let lang = normalize_lang(lang);
        info!("Reconfigured {}: lang={} voice={}", self.engine.name(), lang, voice);
        self.catalog = catalog;
        self.lang = lang;
        self.voice = voice;
        Ok(())
    }

    /// Remove every cached artifact
    pub fn clear_cache(&self) -> Result<usize> {
        self.cache.clear()
    }

    fn transition(&self, state: RequestState) {
        debug!("Request state: {:?}", state);
        if let Some(observer) = &self.observer {
            observer(state);
        }
    }

    fn fail(&self, e: TtsError) -> TtsError {
        error!("Synthesis failed: {}", e);
        self.transition(RequestState::Failed);
        e
    }

    /// Synthesize an utterance and queue its chunks in order
    ///
    /// Each chunk is queued as soon as it is ready, so playback can start
    /// before later chunks are synthesized. The first failing chunk stops
    /// the request; chunks already queued stay queued. Returns the number
    /// of items queued.
    pub fn execute(&self, utterance: &Utterance, ident: Option<&str>, listen: bool) -> Result<usize> {
        let mut count = 0;
        self.run(utterance, ident, listen, |item| {
            self.queue.push(item);
            self.transition(RequestState::Queued);
            count += 1;
        })?;
        Ok(count)
    }

    /// Synthesize an utterance without queueing
    pub fn synthesize(
        &self,
        utterance: &Utterance,
        ident: Option<&str>,
        listen: bool,
    ) -> Result<Vec<OutputItem>> {
        let mut items = Vec::new();
        self.run(utterance, ident, listen, |item| items.push(item))?;
        Ok(items)
    }

    fn run<F>(&self, utterance: &Utterance, ident: Option<&str>, listen: bool, mut emit: F) -> Result<()>
    where
        F: FnMut(OutputItem),
    {
        self.transition(RequestState::Received);
        self.catalog
            .validate(utterance.lang(), utterance.voice())
            .map_err(|e| self.fail(e))?;
        let lang = normalize_lang(utterance.lang());
        self.transition(RequestState::Validated);

        let engine = self.engine.as_ref();
        let chunks = self
            .processor
            .prepare_with(utterance.text(), listen, &|tag| engine.modify_tag(tag));

        for chunk in &chunks {
            let item = self
                .process_chunk(chunk, &lang, utterance.voice(), ident)
                .map_err(|e| self.fail(e))?;
            emit(item);
        }
        Ok(())
    }

    fn process_chunk(
        &self,
        chunk: &Chunk,
        lang: &str,
        voice: &str,
        ident: Option<&str>,
    ) -> Result<OutputItem> {
        self.transition(RequestState::CacheCheck);
        let lookup = self.cache.get_or_synthesize(
            &chunk.text,
            voice,
            self.engine.audio_ext(),
            |out| {
                self.transition(RequestState::Synthesizing);
                self.engine.synthesize(&chunk.text, lang, voice, out)
            },
        )?;
        if lookup.hit {
            self.transition(RequestState::CacheHit);
        }

        let phonemes = self
            .resolver
            .resolve_with(lookup.entry.phonemes, &chunk.text, lang);
        self.transition(RequestState::PhonemesResolved);

        let path = self.apply_effects(&lookup.entry.path)?;
        self.transition(RequestState::EffectsApplied);

        Ok(OutputItem {
            audio_ext: self.engine.audio_ext().to_string(),
            path,
            visemes: phonemes.as_deref().map(map_visemes),
            ident: ident.map(String::from),
            listen: chunk.listen,
        })
    }

    /// Effects never touch the cache entry; the processed copy lives in
    /// `<cache>/tts/fx/`
    fn apply_effects(&self, path: &Path) -> Result<PathBuf> {
        if self.effects.is_empty() {
            return Ok(path.to_path_buf());
        }
        let fx_dir = self.cache.dir().join(FX_DIR);
        fs::create_dir_all(&fx_dir)?;
        let name = path
            .file_name()
            .ok_or_else(|| TtsError::Cache(format!("No file name in {}", path.display())))?;
        self.effects.apply(path, &fx_dir.join(name))
    }

    /// Hand the next queued item to the player
    pub fn deliver(&self) -> Option<OutputItem> {
        let item = self.queue.pop()?;
        self.transition(RequestState::Delivered);
        Some(item)
    }
}

/// Explicit voice, else the engine default for `lang`, else `current`,
/// else `<Engine>Default`
fn pick_voice(
    engine: &dyn SynthesisEngine,
    lang: &str,
    voice: Option<&str>,
    current: Option<&str>,
) -> String {
    if let Some(voice) = voice.filter(|v| !v.is_empty()) {
        return voice.to_string();
    }
    if let Some(voice) = engine.default_voice(lang) {
        return voice;
    }
    match current {
        Some(voice) => voice.to_string(),
        None => format!("{}Default", engine.name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phonemes::PhonemeEntry;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    struct FakeEngine {
        calls: Arc<AtomicUsize>,
        phonemes: Option<Vec<PhonemeEntry>>,
    }

    impl SynthesisEngine for FakeEngine {
        fn name(&self) -> &str {
            "fake"
        }

        fn ssml_tags(&self) -> Vec<String> {
            vec!["speak".to_string()]
        }

        fn max_chunk_chars(&self) -> usize {
            20
        }

        fn default_voice(&self, _lang: &str) -> Option<String> {
            Some("alice".to_string())
        }

        fn validate(&self) -> Result<()> {
            Ok(())
        }

        fn describe_voices(&self) -> Result<VoiceCatalog> {
            Ok([("en-us", vec!["alice", "bob"])].into_iter().collect())
        }

        fn synthesize(
            &self,
            text: &str,
            _lang: &str,
            voice: &str,
            out: &Path,
        ) -> Result<Option<Vec<PhonemeEntry>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            fs::write(out, format!("{}:{}", voice, text))?;
            Ok(self.phonemes.clone())
        }
    }

    fn pipeline(dir: &TempDir) -> (SynthesisPipeline, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = FakeEngine {
            calls: calls.clone(),
            phonemes: None,
        };
        let cache = SynthesisCache::new(dir.path());
        let pipeline = SynthesisPipeline::new(Box::new(engine), "en-US", None, cache).unwrap();
        (pipeline, calls)
    }

    #[test]
    fn test_default_voice_and_lang() {
        let dir = TempDir::new().unwrap();
        let (pipeline, _) = pipeline(&dir);
        assert_eq!(pipeline.voice(), "alice");
        assert_eq!(pipeline.lang(), "en-us");
    }

    #[test]
    fn test_state_sequence() {
        let dir = TempDir::new().unwrap();
        let (pipeline, _) = pipeline(&dir);
        let states = Arc::new(Mutex::new(Vec::new()));
        let seen = states.clone();
        let pipeline = pipeline.with_observer(Box::new(move |s| seen.lock().unwrap().push(s)));

        pipeline.execute(&pipeline.utterance("Hi."), None, false).unwrap();
        pipeline.deliver().unwrap();

        use RequestState::*;
        assert_eq!(
            *states.lock().unwrap(),
            vec![
                Received,
                Validated,
                CacheCheck,
                Synthesizing,
                PhonemesResolved,
                EffectsApplied,
                Queued,
                Delivered
            ]
        );
    }

    #[test]
    fn test_repeat_is_cache_hit() {
        let dir = TempDir::new().unwrap();
        let (pipeline, calls) = pipeline(&dir);
        let utterance = pipeline.utterance("Hello world.");
        let first = pipeline.synthesize(&utterance, None, false).unwrap();
        let second = pipeline.synthesize(&utterance, None, false).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first[0].path, second[0].path);
    }

    #[test]
    fn test_invalid_voice_fails() {
        let dir = TempDir::new().unwrap();
        let (pipeline, calls) = pipeline(&dir);
        let utterance = Utterance::new("Hi.", "en-us", "mallory");
        let err = pipeline.synthesize(&utterance, None, false).unwrap_err();
        assert!(matches!(err, TtsError::Config(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_reconfigure() {
        let dir = TempDir::new().unwrap();
        let (mut pipeline, _) = pipeline(&dir);
        pipeline.reconfigure("en_US", Some("bob")).unwrap();
        assert_eq!(pipeline.voice(), "bob");
        assert_eq!(pipeline.lang(), "en-us");
        assert!(pipeline.reconfigure("de-de", Some("bob")).is_err());
        assert_eq!(pipeline.voice(), "bob");
    }

    #[test]
    fn test_chunk_cap_uses_smaller_limit() {
        let dir = TempDir::new().unwrap();
        let (pipeline, _) = pipeline(&dir);
        let pipeline = pipeline.with_max_chunk_chars(1000);
        let items = pipeline
            .synthesize(&pipeline.utterance("One two three. Four five six."), None, true)
            .unwrap();
        assert_eq!(items.len(), 2);
        assert!(!items[0].listen);
        assert!(items[1].listen);
    }
}
