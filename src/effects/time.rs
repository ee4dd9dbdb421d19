//! Pitch and time-domain effects

use super::{ensure, ensure_positive, fixed, Effect};
use crate::Result;
use log::warn;
use rand::RngCore;
use serde::Deserialize;

/// Shift pitch without changing tempo (WSOLA)
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Pitch {
    /// Semitones to shift, either direction
    pub n_semitones: f64,
    #[serde(default)]
    pub quick: bool,
}

impl Effect for Pitch {
    const NAME: &'static str = "pitch";

    fn args(&self, _rng: &mut dyn RngCore) -> Result<Vec<String>> {
        let mut args = vec![Self::NAME.to_string()];
        if self.quick {
            args.push("-q".into());
        }
        // sox takes cents
        args.push(fixed(self.n_semitones * 100.0));
        Ok(args)
    }
}

fn warn_extreme_factor(effect: &str, factor: f64) {
    if !(0.5..=2.0).contains(&factor) {
        warn!(
            "{}: extreme factor {}, quality of results will be poor",
            effect, factor
        );
    }
}

/// Change tempo without changing pitch
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tempo {
    /// New tempo / old tempo
    pub factor: f64,
    /// `m` music, `s` speech or `l` linear
    #[serde(default)]
    pub audio_type: Option<String>,
    #[serde(default)]
    pub quick: bool,
}

impl Effect for Tempo {
    const NAME: &'static str = "tempo";

    fn args(&self, _rng: &mut dyn RngCore) -> Result<Vec<String>> {
        ensure_positive(Self::NAME, "factor", self.factor)?;
        warn_extreme_factor(Self::NAME, self.factor);
        if (self.factor - 1.0).abs() <= 0.1 {
            warn!("tempo: for factor {} the stretch effect performs better", self.factor);
        }
        if let Some(audio_type) = &self.audio_type {
            ensure(
                matches!(audio_type.as_str(), "m" | "s" | "l"),
                Self::NAME,
                "audio_type",
                "must be one of 'm', 's' or 'l'",
            )?;
        }

        let mut args = vec![Self::NAME.to_string()];
        if self.quick {
            args.push("-q".into());
        }
        if let Some(audio_type) = &self.audio_type {
            args.push(format!("-{}", audio_type));
        }
        args.push(fixed(self.factor));
        Ok(args)
    }
}

/// Change pitch and tempo together
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Speed {
    pub factor: f64,
}

impl Effect for Speed {
    const NAME: &'static str = "speed";

    fn args(&self, _rng: &mut dyn RngCore) -> Result<Vec<String>> {
        ensure_positive(Self::NAME, "factor", self.factor)?;
        warn_extreme_factor(Self::NAME, self.factor);
        Ok(vec![Self::NAME.to_string(), fixed(self.factor)])
    }
}

fn default_window() -> f64 {
    20.0
}

/// Change duration without changing pitch; better than tempo near 1.0
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Stretch {
    pub factor: f64,
    /// Window size in milliseconds
    #[serde(default = "default_window")]
    pub window: f64,
}

impl Effect for Stretch {
    const NAME: &'static str = "stretch";

    fn args(&self, _rng: &mut dyn RngCore) -> Result<Vec<String>> {
        ensure_positive(Self::NAME, "factor", self.factor)?;
        warn_extreme_factor(Self::NAME, self.factor);
        if (self.factor - 1.0).abs() > 0.1 {
            warn!("stretch: for factor {} the tempo effect performs better", self.factor);
        }
        ensure_positive(Self::NAME, "window", self.window)?;
        Ok(vec![
            Self::NAME.to_string(),
            fixed(self.factor),
            fixed(self.window),
        ])
    }
}

fn default_frame_rate() -> i64 {
    25
}

fn default_oversample_rate() -> i64 {
    16
}

/// Bend pitch by given amounts over given time intervals
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bend {
    pub n_bends: usize,
    /// Absolute start times in seconds
    pub start_times: Vec<f64>,
    /// Absolute end times in seconds
    pub end_times: Vec<f64>,
    /// Shift per interval in cents
    pub cents: Vec<f64>,
    #[serde(default = "default_frame_rate")]
    pub frame_rate: i64,
    #[serde(default = "default_oversample_rate")]
    pub oversample_rate: i64,
}

impl Bend {
    fn validate(&self) -> Result<()> {
        let name = Self::NAME;
        ensure(self.n_bends >= 1, name, "n_bends", "must be a positive integer")?;
        ensure(
            self.start_times.len() == self.n_bends,
            name,
            "start_times",
            "length must equal n_bends",
        )?;
        ensure(
            self.end_times.len() == self.n_bends,
            name,
            "end_times",
            "length must equal n_bends",
        )?;
        ensure(
            self.cents.len() == self.n_bends,
            name,
            "cents",
            "length must equal n_bends",
        )?;

        let intervals: Vec<(f64, f64)> = self
            .start_times
            .iter()
            .copied()
            .zip(self.end_times.iter().copied())
            .collect();
        ensure(
            intervals.iter().all(|(start, end)| end > start),
            name,
            "end_times",
            "must be element-wise greater than start_times",
        )?;
        ensure(
            intervals.windows(2).all(|w| w[1].0 >= w[0].1),
            name,
            "start_times",
            "[start_time, end_time] intervals must be non-overlapping",
        )?;
        ensure(
            self.start_times.iter().all(|&t| t > 0.0),
            name,
            "start_times",
            "must be positive",
        )?;
        ensure(
            self.end_times.iter().all(|&t| t > 0.0),
            name,
            "end_times",
            "must be positive",
        )?;
        ensure(
            self.start_times.windows(2).all(|w| w[0] < w[1]),
            name,
            "start_times",
            "must be in increasing order",
        )?;
        ensure(
            self.end_times.windows(2).all(|w| w[0] < w[1]),
            name,
            "end_times",
            "must be in increasing order",
        )?;
        ensure(
            (10..=80).contains(&self.frame_rate),
            name,
            "frame_rate",
            "must be an integer between 10 and 80",
        )?;
        ensure(
            (4..=32).contains(&self.oversample_rate),
            name,
            "oversample_rate",
            "must be an integer between 4 and 32",
        )
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl Effect for Bend {
    const NAME: &'static str = "bend";

    fn args(&self, _rng: &mut dyn RngCore) -> Result<Vec<String>> {
        self.validate()?;

        let mut args = vec![
            Self::NAME.to_string(),
            "-f".into(),
            self.frame_rate.to_string(),
            "-o".into(),
            self.oversample_rate.to_string(),
        ];

        // sox wants each bend as delay-since-previous-end,cents,duration
        let mut last = 0.0;
        for i in 0..self.n_bends {
            let delay = round2(self.start_times[i] - last);
            let duration = round2(self.end_times[i] - self.start_times[i]);
            args.push(format!(
                "{},{},{}",
                fixed(delay),
                fixed(self.cents[i]),
                fixed(duration)
            ));
            last = self.end_times[i];
        }
        Ok(args)
    }
}

/// Play the audio backwards
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Reverse {}

impl Effect for Reverse {
    const NAME: &'static str = "reverse";

    fn args(&self, _rng: &mut dyn RngCore) -> Result<Vec<String>> {
        Ok(vec![Self::NAME.to_string()])
    }
}
