//! Gain, compression and distortion

use super::{ensure, ensure_positive, ensure_range, fixed, Effect};
use crate::Result;
use log::warn;
use rand::RngCore;
use serde::Deserialize;
use std::path::PathBuf;

fn default_twenty() -> f64 {
    20.0
}

/// Non-linear distortion
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Overdrive {
    #[serde(default = "default_twenty")]
    pub gain_db: f64,
    #[serde(default = "default_twenty")]
    pub colour: f64,
}

impl Effect for Overdrive {
    const NAME: &'static str = "overdrive";

    fn args(&self, _rng: &mut dyn RngCore) -> Result<Vec<String>> {
        Ok(vec![
            Self::NAME.to_string(),
            fixed(self.gain_db),
            fixed(self.colour),
        ])
    }
}

fn default_attack() -> f64 {
    0.3
}
fn default_decay() -> f64 {
    0.8
}
fn default_soft_knee() -> Option<f64> {
    Some(6.0)
}
fn default_tf_points() -> Vec<[f64; 2]> {
    vec![[-70.0, -70.0], [-60.0, -20.0], [0.0, 0.0]]
}

/// Compress or expand dynamic range
///
/// `tf_points` is the transfer function as `[input_db, output_db]` pairs.
/// A `null` soft knee disables knee rounding.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Compand {
    #[serde(default = "default_attack")]
    pub attack_time: f64,
    #[serde(default = "default_decay")]
    pub decay_time: f64,
    #[serde(default = "default_soft_knee")]
    pub soft_knee_db: Option<f64>,
    #[serde(default = "default_tf_points")]
    pub tf_points: Vec<[f64; 2]>,
}

impl Effect for Compand {
    const NAME: &'static str = "compand";

    fn args(&self, _rng: &mut dyn RngCore) -> Result<Vec<String>> {
        let name = Self::NAME;
        ensure_positive(name, "attack_time", self.attack_time)?;
        ensure_positive(name, "decay_time", self.decay_time)?;
        if self.attack_time > self.decay_time {
            warn!(
                "compand: attack_time {} is larger than decay_time {}",
                self.attack_time, self.decay_time
            );
        }
        if let Some(knee) = self.soft_knee_db {
            ensure(knee.is_finite(), name, "soft_knee_db", "must be a number or null")?;
        }
        ensure(
            !self.tf_points.is_empty(),
            name,
            "tf_points",
            "must be a non-empty list of [input, output] pairs",
        )?;
        ensure(
            self.tf_points.iter().all(|p| p[0] <= 0.0 && p[1] <= 0.0),
            name,
            "tf_points",
            "elements must be non-positive",
        )?;

        let mut points = self.tf_points.clone();
        points.sort_by(|a, b| a[0].total_cmp(&b[0]));
        ensure(
            points.windows(2).all(|w| w[0][0] < w[1][0]),
            name,
            "tf_points",
            "input values must be unique",
        )?;

        let transfer = points
            .iter()
            .map(|p| format!("{},{}", fixed(p[0]), fixed(p[1])))
            .collect::<Vec<_>>()
            .join(",");
        let transfer = match self.soft_knee_db {
            Some(knee) => format!("{}:{}", fixed(knee), transfer),
            None => transfer,
        };

        Ok(vec![
            name.to_string(),
            format!("{},{}", fixed(self.attack_time), fixed(self.decay_time)),
            transfer,
        ])
    }
}

fn default_contrast() -> f64 {
    75.0
}

/// Speech-friendly loudness enhancement
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Contrast {
    #[serde(default = "default_contrast")]
    pub amount: f64,
}

impl Effect for Contrast {
    const NAME: &'static str = "contrast";

    fn args(&self, _rng: &mut dyn RngCore) -> Result<Vec<String>> {
        ensure_range(Self::NAME, "amount", self.amount, 0.0, 100.0)?;
        Ok(vec![Self::NAME.to_string(), fixed(self.amount)])
    }
}

fn default_true() -> bool {
    true
}

/// Apply amplification or attenuation
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Gain {
    #[serde(default)]
    pub gain_db: f64,
    /// Normalise to 0 dBFS before applying `gain_db`
    #[serde(default = "default_true")]
    pub normalize: bool,
    #[serde(default)]
    pub limiter: bool,
    /// Multichannel balance: `e`, `B` or `b`
    #[serde(default)]
    pub balance: Option<String>,
}

impl Effect for Gain {
    const NAME: &'static str = "gain";

    fn args(&self, _rng: &mut dyn RngCore) -> Result<Vec<String>> {
        let mut args = vec![Self::NAME.to_string()];
        if let Some(balance) = &self.balance {
            ensure(
                matches!(balance.as_str(), "e" | "B" | "b"),
                Self::NAME,
                "balance",
                "must be one of 'e', 'B' or 'b'",
            )?;
            args.push(format!("-{}", balance));
        }
        if self.normalize {
            args.push("-n".into());
        }
        if self.limiter {
            args.push("-l".into());
        }
        args.push(fixed(self.gain_db));
        Ok(args)
    }
}

fn default_loudness_gain() -> f64 {
    -10.0
}
fn default_reference() -> f64 {
    65.0
}

/// Gain with equal-loudness contour compensation
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Loudness {
    #[serde(default = "default_loudness_gain")]
    pub gain_db: f64,
    /// Reference level in dB, 50-75
    #[serde(default = "default_reference")]
    pub reference_level: f64,
}

impl Effect for Loudness {
    const NAME: &'static str = "loudness";

    fn args(&self, _rng: &mut dyn RngCore) -> Result<Vec<String>> {
        ensure_range(Self::NAME, "reference_level", self.reference_level, 50.0, 75.0)?;
        Ok(vec![
            Self::NAME.to_string(),
            fixed(self.gain_db),
            fixed(self.reference_level),
        ])
    }
}

fn default_amount() -> f64 {
    0.5
}

/// Noise reduction using a profile made by `sox noiseprof`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Noisered {
    pub profile_path: PathBuf,
    #[serde(default = "default_amount")]
    pub amount: f64,
}

impl Effect for Noisered {
    const NAME: &'static str = "noisered";

    fn args(&self, _rng: &mut dyn RngCore) -> Result<Vec<String>> {
        ensure(
            self.profile_path.is_file(),
            Self::NAME,
            "profile_path",
            &format!("{} does not exist", self.profile_path.display()),
        )?;
        ensure_range(Self::NAME, "amount", self.amount, 0.0, 1.0)?;
        Ok(vec![
            Self::NAME.to_string(),
            self.profile_path.display().to_string(),
            fixed(self.amount),
        ])
    }
}
