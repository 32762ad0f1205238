//! Sample and mode types for the EEG simulator.
//!
//! These types carry per-band power only - there is no raw waveform anywhere in the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest power any band may report. Negative or zero power is physically meaningless.
pub const POWER_FLOOR: f64 = 0.1;

/// A single timestamped multi-band power reading.
///
/// Samples are created by the generator and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Stream time in seconds (monotonic within a generator run)
    pub timestamp: f64,
    /// 0.5-4 Hz
    pub delta: f64,
    /// 4-8 Hz
    pub theta: f64,
    /// 8-13 Hz
    pub alpha: f64,
    /// 13-30 Hz
    pub beta: f64,
    /// 30-100 Hz
    pub gamma: f64,
}

impl Sample {
    /// Build a sample, flooring every band at [`POWER_FLOOR`].
    pub fn floored(timestamp: f64, bands: [f64; 5]) -> Self {
        let [delta, theta, alpha, beta, gamma] = bands.map(|v| v.max(POWER_FLOOR));
        Self {
            timestamp,
            delta,
            theta,
            alpha,
            beta,
            gamma,
        }
    }

    /// Band powers in delta..gamma order.
    pub fn bands(&self) -> [f64; 5] {
        [self.delta, self.theta, self.alpha, self.beta, self.gamma]
    }
}

/// Target mental-state profile the generator simulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Alpha dominant
    #[default]
    Relaxed,
    /// Beta and gamma elevated
    Focused,
    /// Alpha depressed, beta spiking
    Stressed,
    /// Delta and theta dominant
    Sleepy,
}

impl Mode {
    /// Every mode, in declaration order.
    pub const ALL: [Mode; 4] = [Mode::Relaxed, Mode::Focused, Mode::Stressed, Mode::Sleepy];

    /// Wire name used by the control inlet.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Relaxed => "relaxed",
            Mode::Focused => "focused",
            Mode::Stressed => "stressed",
            Mode::Sleepy => "sleepy",
        }
    }

    /// Parse a wire name. Matching is exact: `"Relaxed"` is not a mode.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "relaxed" => Some(Mode::Relaxed),
            "focused" => Some(Mode::Focused),
            "stressed" => Some(Mode::Stressed),
            "sleepy" => Some(Mode::Sleepy),
            _ => None,
        }
    }

    /// Base band values this mode is simulated around.
    pub fn profile(&self) -> BandProfile {
        match self {
            Mode::Relaxed => BandProfile::new(5.0, 8.0, 15.0, 5.0, 2.0),
            Mode::Focused => BandProfile::new(3.0, 5.0, 7.0, 18.0, 8.0),
            Mode::Stressed => BandProfile::new(4.0, 6.0, 4.0, 20.0, 12.0),
            Mode::Sleepy => BandProfile::new(12.0, 10.0, 6.0, 3.0, 1.0),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Base power per band; the generator adds shared noise on top.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandProfile {
    pub delta: f64,
    pub theta: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl BandProfile {
    /// Flat mid-range profile used when a mode name is not recognised.
    pub const FLAT: BandProfile = BandProfile {
        delta: 5.0,
        theta: 5.0,
        alpha: 5.0,
        beta: 5.0,
        gamma: 5.0,
    };

    pub const fn new(delta: f64, theta: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        Self {
            delta,
            theta,
            alpha,
            beta,
            gamma,
        }
    }

    /// Profile for a wire mode name, falling back to [`BandProfile::FLAT`].
    pub fn for_mode_name(name: &str) -> Self {
        Mode::parse(name)
            .map(|mode| mode.profile())
            .unwrap_or(Self::FLAT)
    }

    /// Band values in delta..gamma order.
    pub fn bands(&self) -> [f64; 5] {
        [self.delta, self.theta, self.alpha, self.beta, self.gamma]
    }
}
