//! Speech synthesis: engine contract, backends, voices and output queue

pub mod backends;
pub mod queue;
pub mod synth;
pub mod voices;

pub use queue::{OutputItem, OutputQueue};
pub use synth::{create_engine, SynthesisEngine, MODULES};
pub use voices::VoiceCatalog;
