//! Delay-line and modulation effects

use super::{ensure, ensure_positive, ensure_range, fixed, Effect};
use crate::Result;
use rand::{Rng, RngCore};
use serde::Deserialize;

fn ensure_gain(effect: &str, param: &str, value: f64) -> Result<()> {
    ensure(
        value > 0.0 && value <= 1.0,
        effect,
        param,
        "must be a number between 0 and 1",
    )
}

/// Use `given` if present (checking its length), else generate `count`
/// values with `generate`
fn per_voice<T>(
    effect: &str,
    param: &str,
    given: &Option<Vec<T>>,
    count: usize,
    count_name: &str,
    mut generate: impl FnMut() -> T,
) -> Result<Vec<T>>
where
    T: Clone,
{
    match given {
        Some(values) => {
            ensure(
                values.len() == count,
                effect,
                param,
                &format!("length must equal {}", count_name),
            )?;
            Ok(values.clone())
        }
        None => Ok((0..count).map(|_| generate()).collect()),
    }
}

fn default_phaser_gain_in() -> f64 {
    0.8
}
fn default_phaser_gain_out() -> f64 {
    0.74
}
fn default_phaser_delay() -> f64 {
    3.0
}
fn default_phaser_decay() -> f64 {
    0.4
}
fn default_half() -> f64 {
    0.5
}
fn default_sinusoidal() -> String {
    "sinusoidal".into()
}

/// Phasing effect
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Phaser {
    #[serde(default = "default_phaser_gain_in")]
    pub gain_in: f64,
    #[serde(default = "default_phaser_gain_out")]
    pub gain_out: f64,
    /// Milliseconds, 0-5
    #[serde(default = "default_phaser_delay")]
    pub delay: f64,
    /// Relative to gain_in, 0.1-0.5
    #[serde(default = "default_phaser_decay")]
    pub decay: f64,
    /// Hz, 0.1-2
    #[serde(default = "default_half")]
    pub speed: f64,
    /// `sinusoidal` or `triangular`
    #[serde(default = "default_sinusoidal")]
    pub modulation_shape: String,
}

impl Effect for Phaser {
    const NAME: &'static str = "phaser";

    fn args(&self, _rng: &mut dyn RngCore) -> Result<Vec<String>> {
        let name = Self::NAME;
        ensure_range(name, "gain_in", self.gain_in, 0.0, 1.0)?;
        ensure_range(name, "gain_out", self.gain_out, 0.0, 1.0)?;
        ensure_range(name, "delay", self.delay, 0.0, 5.0)?;
        ensure_range(name, "decay", self.decay, 0.1, 0.5)?;
        ensure_range(name, "speed", self.speed, 0.1, 2.0)?;
        let shape = match self.modulation_shape.as_str() {
            "sinusoidal" => "-s",
            "triangular" => "-t",
            _ => {
                return Err(crate::TtsError::effect(
                    name,
                    "modulation_shape",
                    "must be 'sinusoidal' or 'triangular'",
                ))
            }
        };

        Ok(vec![
            name.to_string(),
            fixed(self.gain_in),
            fixed(self.gain_out),
            fixed(self.delay),
            fixed(self.decay),
            fixed(self.speed),
            shape.to_string(),
        ])
    }
}

fn default_flanger_depth() -> f64 {
    2.0
}
fn default_flanger_width() -> f64 {
    71.0
}
fn default_flanger_phase() -> f64 {
    25.0
}
fn default_sine() -> String {
    "sine".into()
}
fn default_linear() -> String {
    "linear".into()
}

/// Flanging effect
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Flanger {
    /// Base delay in ms, 0-30
    #[serde(default)]
    pub delay: f64,
    /// Swept delay in ms, 0-10
    #[serde(default = "default_flanger_depth")]
    pub depth: f64,
    /// Percent regeneration, -95 to 95
    #[serde(default)]
    pub regen: f64,
    /// Percent of delayed signal mixed in, 0-100
    #[serde(default = "default_flanger_width")]
    pub width: f64,
    /// Sweeps per second, 0.1-10
    #[serde(default = "default_half")]
    pub speed: f64,
    /// `sine` or `triangle`
    #[serde(default = "default_sine")]
    pub shape: String,
    /// Percent phase shift between channels, 0-100
    #[serde(default = "default_flanger_phase")]
    pub phase: f64,
    /// `linear` or `quadratic`
    #[serde(default = "default_linear")]
    pub interp: String,
}

impl Effect for Flanger {
    const NAME: &'static str = "flanger";

    fn args(&self, _rng: &mut dyn RngCore) -> Result<Vec<String>> {
        let name = Self::NAME;
        ensure_range(name, "delay", self.delay, 0.0, 30.0)?;
        ensure_range(name, "depth", self.depth, 0.0, 10.0)?;
        ensure_range(name, "regen", self.regen, -95.0, 95.0)?;
        ensure_range(name, "width", self.width, 0.0, 100.0)?;
        ensure_range(name, "speed", self.speed, 0.1, 10.0)?;
        ensure(
            matches!(self.shape.as_str(), "sine" | "triangle"),
            name,
            "shape",
            "must be 'sine' or 'triangle'",
        )?;
        ensure_range(name, "phase", self.phase, 0.0, 100.0)?;
        ensure(
            matches!(self.interp.as_str(), "linear" | "quadratic"),
            name,
            "interp",
            "must be 'linear' or 'quadratic'",
        )?;

        Ok(vec![
            name.to_string(),
            fixed(self.delay),
            fixed(self.depth),
            fixed(self.regen),
            fixed(self.width),
            fixed(self.speed),
            self.shape.clone(),
            fixed(self.phase),
            self.interp.clone(),
        ])
    }
}

fn default_fifty() -> f64 {
    50.0
}
fn default_hundred() -> f64 {
    100.0
}

/// Freeverb reverberation
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Reverb {
    #[serde(default = "default_fifty")]
    pub reverberance: f64,
    #[serde(default = "default_fifty")]
    pub high_freq_damping: f64,
    #[serde(default = "default_hundred")]
    pub room_scale: f64,
    #[serde(default = "default_hundred")]
    pub stereo_depth: f64,
    /// Milliseconds
    #[serde(default)]
    pub pre_delay: f64,
    /// dB
    #[serde(default)]
    pub wet_gain: f64,
    #[serde(default)]
    pub wet_only: bool,
}

impl Effect for Reverb {
    const NAME: &'static str = "reverb";

    fn args(&self, _rng: &mut dyn RngCore) -> Result<Vec<String>> {
        let name = Self::NAME;
        ensure_range(name, "reverberance", self.reverberance, 0.0, 100.0)?;
        ensure_range(name, "high_freq_damping", self.high_freq_damping, 0.0, 100.0)?;
        ensure_range(name, "room_scale", self.room_scale, 0.0, 100.0)?;
        ensure_range(name, "stereo_depth", self.stereo_depth, 0.0, 100.0)?;
        ensure(self.pre_delay >= 0.0, name, "pre_delay", "must not be negative")?;

        let mut args = vec![name.to_string()];
        if self.wet_only {
            args.push("-w".into());
        }
        args.extend([
            fixed(self.reverberance),
            fixed(self.high_freq_damping),
            fixed(self.room_scale),
            fixed(self.stereo_depth),
            fixed(self.pre_delay),
            fixed(self.wet_gain),
        ]);
        Ok(args)
    }
}

fn default_tremolo_speed() -> f64 {
    6.0
}
fn default_tremolo_depth() -> f64 {
    40.0
}

/// Low frequency amplitude modulation
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tremolo {
    /// Hz
    #[serde(default = "default_tremolo_speed")]
    pub speed: f64,
    /// Percent of total amplitude
    #[serde(default = "default_tremolo_depth")]
    pub depth: f64,
}

impl Effect for Tremolo {
    const NAME: &'static str = "tremolo";

    fn args(&self, _rng: &mut dyn RngCore) -> Result<Vec<String>> {
        ensure_positive(Self::NAME, "speed", self.speed)?;
        ensure_range(Self::NAME, "depth", self.depth, 0.0, 100.0)?;
        Ok(vec![
            Self::NAME.to_string(),
            fixed(self.speed),
            fixed(self.depth),
        ])
    }
}

fn default_chorus_gain_in() -> f64 {
    0.5
}
fn default_chorus_gain_out() -> f64 {
    0.9
}
fn default_voices() -> usize {
    3
}

/// Chorus: several short, modulated delays
///
/// Omitted per-voice lists are generated: delays 40-60 ms, decays 0.3-0.4,
/// speeds 0.25-0.4 Hz, depths 1-3 ms, random shapes.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Chorus {
    #[serde(default = "default_chorus_gain_in")]
    pub gain_in: f64,
    #[serde(default = "default_chorus_gain_out")]
    pub gain_out: f64,
    #[serde(default = "default_voices")]
    pub n_voices: usize,
    #[serde(default)]
    pub delays: Option<Vec<f64>>,
    #[serde(default)]
    pub decays: Option<Vec<f64>>,
    #[serde(default)]
    pub speeds: Option<Vec<f64>>,
    #[serde(default)]
    pub depths: Option<Vec<f64>>,
    /// `s` sinusoidal or `t` triangular, per voice
    #[serde(default)]
    pub shapes: Option<Vec<String>>,
}

impl Effect for Chorus {
    const NAME: &'static str = "chorus";

    fn args(&self, rng: &mut dyn RngCore) -> Result<Vec<String>> {
        let name = Self::NAME;
        ensure_gain(name, "gain_in", self.gain_in)?;
        ensure_gain(name, "gain_out", self.gain_out)?;
        ensure(self.n_voices > 0, name, "n_voices", "must be a positive integer")?;

        let n = self.n_voices;
        let delays = per_voice(name, "delays", &self.delays, n, "n_voices", || {
            rng.gen_range(40.0..60.0)
        })?;
        let decays = per_voice(name, "decays", &self.decays, n, "n_voices", || {
            rng.gen_range(0.3..0.4)
        })?;
        let speeds = per_voice(name, "speeds", &self.speeds, n, "n_voices", || {
            rng.gen_range(0.25..0.4)
        })?;
        let depths = per_voice(name, "depths", &self.depths, n, "n_voices", || {
            rng.gen_range(1.0..3.0)
        })?;
        let shapes = per_voice(name, "shapes", &self.shapes, n, "n_voices", || {
            let shape = if rng.gen_bool(0.5) { "t" } else { "s" };
            shape.to_string()
        })?;
        ensure(
            shapes.iter().all(|s| s == "s" || s == "t"),
            name,
            "shapes",
            "elements must be 's' or 't'",
        )?;

        let mut args = vec![name.to_string(), fixed(self.gain_in), fixed(self.gain_out)];
        for i in 0..n {
            args.extend([
                fixed(delays[i]),
                fixed(decays[i]),
                fixed(speeds[i]),
                fixed(depths[i]),
                format!("-{}", shapes[i]),
            ]);
        }
        Ok(args)
    }
}

fn default_echo_gain_in() -> f64 {
    0.8
}
fn default_echo_gain_out() -> f64 {
    0.9
}
fn default_echos() -> usize {
    1
}

/// Delay in ms used for each echo when none are given
const DEFAULT_ECHO_DELAY: f64 = 60.0;
/// Decay used for each echo when none are given
const DEFAULT_ECHO_DECAY: f64 = 0.4;

/// Echoes with individual delays and decays
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Echo {
    #[serde(default = "default_echo_gain_in")]
    pub gain_in: f64,
    #[serde(default = "default_echo_gain_out")]
    pub gain_out: f64,
    #[serde(default = "default_echos")]
    pub n_echos: usize,
    /// Milliseconds
    #[serde(default)]
    pub delays: Option<Vec<f64>>,
    /// Relative to gain_in, 0-1
    #[serde(default)]
    pub decays: Option<Vec<f64>>,
}

impl Effect for Echo {
    const NAME: &'static str = "echo";

    fn args(&self, _rng: &mut dyn RngCore) -> Result<Vec<String>> {
        let name = Self::NAME;
        ensure_gain(name, "gain_in", self.gain_in)?;
        ensure_gain(name, "gain_out", self.gain_out)?;
        ensure(self.n_echos > 0, name, "n_echos", "must be a positive integer")?;

        let n = self.n_echos;
        let delays = per_voice(name, "delays", &self.delays, n, "n_echos", || {
            DEFAULT_ECHO_DELAY
        })?;
        let decays = per_voice(name, "decays", &self.decays, n, "n_echos", || {
            DEFAULT_ECHO_DECAY
        })?;
        ensure(
            delays.iter().all(|&d| d > 0.0),
            name,
            "delays",
            "must be positive",
        )?;
        ensure(
            decays.iter().all(|&d| (0.0..=1.0).contains(&d)),
            name,
            "decays",
            "must be between 0 and 1",
        )?;

        let mut args = vec![name.to_string(), fixed(self.gain_in), fixed(self.gain_out)];
        for i in 0..n {
            args.extend([fixed(delays[i]), fixed(decays[i])]);
        }
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TtsError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn chorus(n_voices: usize) -> Chorus {
        Chorus {
            gain_in: 0.5,
            gain_out: 0.9,
            n_voices,
            delays: None,
            decays: None,
            speeds: None,
            depths: None,
            shapes: None,
        }
    }

    fn failing_param(result: Result<Vec<String>>) -> String {
        match result.unwrap_err() {
            TtsError::Effect { param, .. } => param,
            e => panic!("unexpected error: {}", e),
        }
    }

    #[test]
    fn test_chorus_length_mismatch() {
        let mut c = chorus(3);
        c.delays = Some(vec![1.0, 2.0]);
        assert_eq!(failing_param(c.args(&mut rng())), "delays");
    }

    #[test]
    fn test_chorus_explicit_voices_in_order() {
        let c = Chorus {
            gain_in: 0.5,
            gain_out: 0.9,
            n_voices: 2,
            delays: Some(vec![45.0, 50.0]),
            decays: Some(vec![0.35, 0.35]),
            speeds: Some(vec![0.3, 0.3]),
            depths: Some(vec![2.0, 2.0]),
            shapes: Some(vec!["s".into(), "t".into()]),
        };
        assert_eq!(
            c.args(&mut rng()).unwrap(),
            vec![
                "chorus", "0.500000", "0.900000", "45.000000", "0.350000", "0.300000",
                "2.000000", "-s", "50.000000", "0.350000", "0.300000", "2.000000", "-t",
            ]
        );
    }

    #[test]
    fn test_chorus_generated_values_in_range() {
        let args = chorus(4).args(&mut rng()).unwrap();
        assert_eq!(args.len(), 3 + 4 * 5);
        for voice in args[3..].chunks(5) {
            let delay: f64 = voice[0].parse().unwrap();
            let decay: f64 = voice[1].parse().unwrap();
            let speed: f64 = voice[2].parse().unwrap();
            let depth: f64 = voice[3].parse().unwrap();
            assert!((40.0..=60.0).contains(&delay));
            assert!((0.3..=0.4).contains(&decay));
            assert!((0.25..=0.4).contains(&speed));
            assert!((1.0..=3.0).contains(&depth));
            assert!(voice[4] == "-s" || voice[4] == "-t");
        }
    }

    #[test]
    fn test_chorus_bad_shape() {
        let mut c = chorus(1);
        c.shapes = Some(vec!["q".into()]);
        assert_eq!(failing_param(c.args(&mut rng())), "shapes");
    }

    #[test]
    fn test_chorus_gain() {
        let mut c = chorus(1);
        c.gain_in = 0.0;
        assert_eq!(failing_param(c.args(&mut rng())), "gain_in");
    }

    #[test]
    fn test_echo_defaults() {
        let echo = Echo {
            gain_in: 0.8,
            gain_out: 0.9,
            n_echos: 2,
            delays: None,
            decays: None,
        };
        assert_eq!(
            echo.args(&mut rng()).unwrap(),
            vec![
                "echo", "0.800000", "0.900000", "60.000000", "0.400000", "60.000000",
                "0.400000"
            ]
        );
    }

    #[test]
    fn test_echo_mismatch() {
        let echo = Echo {
            gain_in: 0.8,
            gain_out: 0.9,
            n_echos: 2,
            delays: Some(vec![60.0]),
            decays: None,
        };
        assert_eq!(failing_param(echo.args(&mut rng())), "delays");
    }

    #[test]
    fn test_reverb() {
        let reverb: Reverb = serde_json::from_str(r#"{"wet_only": true}"#).unwrap();
        assert_eq!(
            reverb.args(&mut rng()).unwrap(),
            vec![
                "reverb", "-w", "50.000000", "50.000000", "100.000000", "100.000000",
                "0.000000", "0.000000"
            ]
        );
        let reverb: Reverb = serde_json::from_str(r#"{"reverberance": 120}"#).unwrap();
        assert_eq!(failing_param(reverb.args(&mut rng())), "reverberance");
    }

    #[test]
    fn test_phaser_shape() {
        let phaser: Phaser = serde_json::from_str(r#"{"modulation_shape": "triangular"}"#).unwrap();
        assert_eq!(phaser.args(&mut rng()).unwrap().last().unwrap(), "-t");
        let phaser: Phaser = serde_json::from_str(r#"{"modulation_shape": "square"}"#).unwrap();
        assert_eq!(failing_param(phaser.args(&mut rng())), "modulation_shape");
    }

    #[test]
    fn test_flanger_defaults() {
        let flanger: Flanger = serde_json::from_str("{}").unwrap();
        assert_eq!(
            flanger.args(&mut rng()).unwrap(),
            vec![
                "flanger", "0.000000", "2.000000", "0.000000", "71.000000", "0.500000", "sine",
                "25.000000", "linear"
            ]
        );
    }
}
