//! Equalization and biquad filters

use super::{ensure, ensure_positive, fixed, Effect};
use crate::Result;
use rand::RngCore;
use serde::Deserialize;

fn default_treble_freq() -> f64 {
    3000.0
}
fn default_slope() -> f64 {
    0.5
}
fn default_bass_freq() -> f64 {
    100.0
}
fn default_width_q() -> f64 {
    2.0
}
fn default_pass_width_q() -> f64 {
    0.707
}
fn default_poles() -> u8 {
    2
}

fn width(q: f64) -> String {
    format!("{}q", fixed(q))
}

/// Boost or cut high frequencies (shelving filter)
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Treble {
    pub gain_db: f64,
    #[serde(default = "default_treble_freq")]
    pub frequency: f64,
    #[serde(default = "default_slope")]
    pub slope: f64,
}

impl Effect for Treble {
    const NAME: &'static str = "treble";

    fn args(&self, _rng: &mut dyn RngCore) -> Result<Vec<String>> {
        ensure_positive(Self::NAME, "frequency", self.frequency)?;
        ensure(
            self.slope > 0.0 && self.slope <= 1.0,
            Self::NAME,
            "slope",
            "must be a number between 0 and 1",
        )?;
        Ok(vec![
            Self::NAME.to_string(),
            fixed(self.gain_db),
            fixed(self.frequency),
            format!("{}s", fixed(self.slope)),
        ])
    }
}

/// Boost or cut low frequencies (shelving filter)
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bass {
    pub gain_db: f64,
    #[serde(default = "default_bass_freq")]
    pub frequency: f64,
    #[serde(default = "default_slope")]
    pub slope: f64,
}

impl Effect for Bass {
    const NAME: &'static str = "bass";

    fn args(&self, _rng: &mut dyn RngCore) -> Result<Vec<String>> {
        ensure_positive(Self::NAME, "frequency", self.frequency)?;
        ensure(
            self.slope > 0.0 && self.slope <= 1.0,
            Self::NAME,
            "slope",
            "must be a number between 0 and 1",
        )?;
        Ok(vec![
            Self::NAME.to_string(),
            fixed(self.gain_db),
            fixed(self.frequency),
            format!("{}s", fixed(self.slope)),
        ])
    }
}

/// Two-pole all-pass filter
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Allpass {
    pub frequency: f64,
    #[serde(default = "default_width_q")]
    pub width_q: f64,
}

impl Effect for Allpass {
    const NAME: &'static str = "allpass";

    fn args(&self, _rng: &mut dyn RngCore) -> Result<Vec<String>> {
        ensure_positive(Self::NAME, "frequency", self.frequency)?;
        ensure_positive(Self::NAME, "width_q", self.width_q)?;
        Ok(vec![
            Self::NAME.to_string(),
            fixed(self.frequency),
            width(self.width_q),
        ])
    }
}

/// Two-pole band-pass filter
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bandpass {
    pub frequency: f64,
    #[serde(default = "default_width_q")]
    pub width_q: f64,
    /// Constant skirt gain instead of constant 0 dB peak gain
    #[serde(default)]
    pub constant_skirt: bool,
}

impl Effect for Bandpass {
    const NAME: &'static str = "bandpass";

    fn args(&self, _rng: &mut dyn RngCore) -> Result<Vec<String>> {
        ensure_positive(Self::NAME, "frequency", self.frequency)?;
        ensure_positive(Self::NAME, "width_q", self.width_q)?;
        let mut args = vec![Self::NAME.to_string()];
        if self.constant_skirt {
            args.push("-c".into());
        }
        args.extend([fixed(self.frequency), width(self.width_q)]);
        Ok(args)
    }
}

/// Two-pole band-reject filter
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bandreject {
    pub frequency: f64,
    #[serde(default = "default_width_q")]
    pub width_q: f64,
}

impl Effect for Bandreject {
    const NAME: &'static str = "bandreject";

    fn args(&self, _rng: &mut dyn RngCore) -> Result<Vec<String>> {
        ensure_positive(Self::NAME, "frequency", self.frequency)?;
        ensure_positive(Self::NAME, "width_q", self.width_q)?;
        Ok(vec![
            Self::NAME.to_string(),
            fixed(self.frequency),
            width(self.width_q),
        ])
    }
}

/// Peaking equalizer around one frequency
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Equalizer {
    pub frequency: f64,
    pub width_q: f64,
    pub gain_db: f64,
}

impl Effect for Equalizer {
    const NAME: &'static str = "equalizer";

    fn args(&self, _rng: &mut dyn RngCore) -> Result<Vec<String>> {
        ensure_positive(Self::NAME, "frequency", self.frequency)?;
        ensure_positive(Self::NAME, "width_q", self.width_q)?;
        Ok(vec![
            Self::NAME.to_string(),
            fixed(self.frequency),
            width(self.width_q),
            fixed(self.gain_db),
        ])
    }
}

fn pass_args(name: &str, frequency: f64, width_q: f64, n_poles: u8) -> Result<Vec<String>> {
    ensure_positive(name, "frequency", frequency)?;
    ensure_positive(name, "width_q", width_q)?;
    ensure(
        n_poles == 1 || n_poles == 2,
        name,
        "n_poles",
        "must be 1 or 2",
    )?;

    let mut args = vec![name.to_string(), format!("-{}", n_poles), fixed(frequency)];
    // width only applies to the two-pole filter
    if n_poles == 2 {
        args.push(width(width_q));
    }
    Ok(args)
}

/// Attenuate frequencies below `frequency`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Highpass {
    pub frequency: f64,
    #[serde(default = "default_pass_width_q")]
    pub width_q: f64,
    #[serde(default = "default_poles")]
    pub n_poles: u8,
}

impl Effect for Highpass {
    const NAME: &'static str = "highpass";

    fn args(&self, _rng: &mut dyn RngCore) -> Result<Vec<String>> {
        pass_args(Self::NAME, self.frequency, self.width_q, self.n_poles)
    }
}

/// Attenuate frequencies above `frequency`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Lowpass {
    pub frequency: f64,
    #[serde(default = "default_pass_width_q")]
    pub width_q: f64,
    #[serde(default = "default_poles")]
    pub n_poles: u8,
}

impl Effect for Lowpass {
    const NAME: &'static str = "lowpass";

    fn args(&self, _rng: &mut dyn RngCore) -> Result<Vec<String>> {
        pass_args(Self::NAME, self.frequency, self.width_q, self.n_poles)
    }
}
