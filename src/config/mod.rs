//! Configuration: JSON engine selection plus INI pipeline settings

pub mod engine;
pub mod settings;

pub use engine::TtsConfig;
pub use settings::Settings;
