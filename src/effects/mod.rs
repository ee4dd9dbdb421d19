//! Post-synthesis audio effects
//!
//! An effect chain is an ordered list of named effects, each with its own
//! parameters. Every effect validates its parameters and contributes a
//! fixed-grammar argument list; the lists are concatenated in order and the
//! whole chain runs as a single `sox <input> <output> <effects...>` call.
//!
//! New effects are added by implementing [`Effect`] and registering the
//! type in [`REGISTRY`].

pub mod dynamics;
pub mod filters;
pub mod modulation;
pub mod time;

use crate::{Result, TtsError};
use log::{debug, error};
use once_cell::sync::Lazy;
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Default signal-processing executable
pub const SOX: &str = "sox";

/// An effect with validated parameters
pub trait Effect: DeserializeOwned {
    /// Name used in configuration and as the sox effect token
    const NAME: &'static str;

    /// Validate and produce this effect's argument list
    fn args(&self, rng: &mut dyn RngCore) -> Result<Vec<String>>;
}

type Builder = fn(&Map<String, Value>, &mut dyn RngCore) -> Result<Vec<String>>;

fn build<E: Effect>(params: &Map<String, Value>, rng: &mut dyn RngCore) -> Result<Vec<String>> {
    let effect: E = serde_json::from_value(Value::Object(params.clone())).map_err(|e| {
        let reason = e.to_string();
        let param = offending_field(&reason).unwrap_or("parameters").to_string();
        TtsError::Effect {
            effect: E::NAME.to_string(),
            param,
            reason,
        }
    })?;
    effect.args(rng)
}

/// Pull the field name out of a serde message like "missing field `factor`"
fn offending_field(message: &str) -> Option<&str> {
    let start = message.find('`')? + 1;
    let len = message[start..].find('`')?;
    Some(&message[start..start + len])
}

/// Effect name -> builder
pub static REGISTRY: Lazy<HashMap<&'static str, Builder>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, Builder> = HashMap::new();
    fn register<E: Effect>(m: &mut HashMap<&'static str, Builder>) {
        m.insert(E::NAME, build::<E>);
    }

    register::<time::Pitch>(&mut m);
    register::<time::Tempo>(&mut m);
    register::<time::Speed>(&mut m);
    register::<time::Stretch>(&mut m);
    register::<time::Bend>(&mut m);
    register::<time::Reverse>(&mut m);
    register::<modulation::Phaser>(&mut m);
    register::<modulation::Flanger>(&mut m);
    register::<modulation::Reverb>(&mut m);
    register::<modulation::Tremolo>(&mut m);
    register::<modulation::Chorus>(&mut m);
    register::<modulation::Echo>(&mut m);
    register::<filters::Treble>(&mut m);
    register::<filters::Bass>(&mut m);
    register::<filters::Allpass>(&mut m);
    register::<filters::Bandpass>(&mut m);
    register::<filters::Bandreject>(&mut m);
    register::<filters::Equalizer>(&mut m);
    register::<filters::Highpass>(&mut m);
    register::<filters::Lowpass>(&mut m);
    register::<dynamics::Overdrive>(&mut m);
    register::<dynamics::Compand>(&mut m);
    register::<dynamics::Contrast>(&mut m);
    register::<dynamics::Gain>(&mut m);
    register::<dynamics::Loudness>(&mut m);
    register::<dynamics::Noisered>(&mut m);
    m
});

/// Fixed-point formatting understood by sox (never scientific notation)
pub(crate) fn fixed(value: f64) -> String {
    format!("{:.6}", value)
}

pub(crate) fn ensure(condition: bool, effect: &str, param: &str, reason: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(TtsError::effect(effect, param, reason))
    }
}

pub(crate) fn ensure_positive(effect: &str, param: &str, value: f64) -> Result<()> {
    ensure(value > 0.0, effect, param, "must be a positive number")
}

pub(crate) fn ensure_range(effect: &str, param: &str, value: f64, lo: f64, hi: f64) -> Result<()> {
    ensure(
        (lo..=hi).contains(&value),
        effect,
        param,
        &format!("must be between {} and {}", lo, hi),
    )
}

/// One configured effect: name plus raw parameters
#[derive(Debug, Clone, PartialEq)]
pub struct EffectSpec {
    pub name: String,
    pub params: Map<String, Value>,
}

impl EffectSpec {
    pub fn new(name: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Validate parameters and build this effect's arguments
    pub fn build(&self, rng: &mut dyn RngCore) -> Result<Vec<String>> {
        let builder = REGISTRY
            .get(self.name.as_str())
            .ok_or_else(|| TtsError::effect(&self.name, "name", "unknown effect"))?;
        builder(&self.params, rng)
    }
}

/// Ordered effect chain applied to synthesized audio
#[derive(Debug, Clone)]
pub struct EffectChain {
    specs: Vec<EffectSpec>,
    sox: String,
}

impl Default for EffectChain {
    fn default() -> Self {
        Self {
            specs: Vec::new(),
            sox: SOX.to_string(),
        }
    }
}

impl EffectChain {
    /// Build a chain, validating every effect up front
    pub fn new(specs: Vec<EffectSpec>) -> Result<Self> {
        let chain = Self {
            specs,
            sox: SOX.to_string(),
        };
        chain.build_args_with(&mut rand::thread_rng())?;
        Ok(chain)
    }

    /// Chain from an `effects` config object, in the object's order
    ///
    /// Effects without parameters may be given as `{}`, `null` or `true`.
    pub fn from_config(effects: &Map<String, Value>) -> Result<Self> {
        let specs = effects
            .iter()
            .map(|(name, params)| match params {
                Value::Object(map) => Ok(EffectSpec::new(name.clone(), map.clone())),
                Value::Null | Value::Bool(true) => Ok(EffectSpec::new(name.clone(), Map::new())),
                _ => Err(TtsError::effect(name, "parameters", "must be an object")),
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(specs)
    }

    /// Use a different sox executable
    pub fn with_sox(mut self, sox: impl Into<String>) -> Self {
        self.sox = sox.into();
        self
    }

    /// Executable the chain runs
    pub fn sox(&self) -> &str {
        &self.sox
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn specs(&self) -> &[EffectSpec] {
        &self.specs
    }

    /// Concatenated effect arguments, preserving chain order
    pub fn build_args(&self) -> Result<Vec<String>> {
        self.build_args_with(&mut rand::thread_rng())
    }

    /// Same as [`build_args`](Self::build_args) with a caller-supplied
    /// source for auto-generated parameters
    pub fn build_args_with(&self, rng: &mut dyn RngCore) -> Result<Vec<String>> {
        let mut args = Vec::new();
        for spec in &self.specs {
            debug!("Adding effect {}", spec.name);
            args.extend(spec.build(rng)?);
        }
        Ok(args)
    }

    /// Full command line: `sox <input> <output> <effects...>`
    pub fn command_line(&self, input: &Path, output: &Path) -> Result<Vec<String>> {
        let mut cmd = vec![
            self.sox.clone(),
            input.display().to_string(),
            output.display().to_string(),
        ];
        cmd.extend(self.build_args()?);
        Ok(cmd)
    }

    /// Apply the chain to `input`, writing `output` (which may be the same
    /// file)
    ///
    /// sox writes to a temporary file next to `output` that is renamed over
    /// it on success, so readers never see a half-written file and a failed
    /// run leaves `output` untouched.
    pub fn apply(&self, input: &Path, output: &Path) -> Result<PathBuf> {
        // validated before any process starts
        let args = self.build_args()?;

        if args.is_empty() {
            if input != output {
                fs::copy(input, output)?;
            }
            return Ok(output.to_path_buf());
        }

        let dir = match output.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let suffix = output
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let tmp = tempfile::Builder::new()
            .prefix(".fx-")
            .suffix(&suffix)
            .tempfile_in(dir)?;

        debug!("Running {} with {} effect args", self.sox, args.len());
        let result = Command::new(&self.sox)
            .arg(input)
            .arg(tmp.path())
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                error!("Failed to spawn {}: {}", self.sox, e);
                TtsError::Backend(format!("Failed to start {}: {}", self.sox, e))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            error!("{} exited with {}: {}", self.sox, result.status, stderr.trim());
            return Err(TtsError::Backend(format!(
                "{} exited with {}: {}",
                self.sox,
                result.status,
                stderr.trim()
            )));
        }

        tmp.persist(output).map_err(|e| TtsError::Io(e.error))?;
        Ok(output.to_path_buf())
    }
}
