//! text2speech - pluggable text-to-speech
//!
//! One request flows through [`pipeline::SynthesisPipeline`]: SSML is
//! filtered for the selected engine, text is chunked, each chunk is served
//! from the content-addressed cache or synthesized by a
//! [`speech::SynthesisEngine`] backend, annotated with phonemes and
//! visemes, run through the sox voice-effects chain and queued for
//! playback.

pub mod cache;
pub mod config;
pub mod effects;
pub mod error;
pub mod phonemes;
pub mod pipeline;
pub mod platform;
pub mod speech;
pub mod text;

pub use error::{Result, TtsError};
pub use pipeline::{RequestState, SynthesisPipeline, Utterance};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "text2speech";
