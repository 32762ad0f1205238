//! Rule-based mental state classification from window band powers.
//!
//! Each band is converted to its share of total power and fed through fixed threshold formulas:
//! - Stress: high beta, low alpha, some gamma
//! - Focus: beta inside the 20-35% band, gamma, minus an alpha distraction penalty
//! - Sleepiness: delta and theta share, plus any beta shortfall below 30%
//!
//! The classifier holds no state between calls.

use crate::core::features::BandPowers;
use serde::{Deserialize, Serialize};

/// Below this total power the signal is not trusted and a zero-confidence state is returned.
pub const MIN_TRUSTED_TOTAL_POWER: f64 = 1.0;

/// Mental state estimate for one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MentalState {
    /// 0 = calm, 100 = highly stressed
    pub stress_level: u8,
    /// 0 = scattered, 100 = highly focused
    pub focus_level: u8,
    /// 0 = alert, 100 = very sleepy
    pub sleepiness_level: u8,
    /// Coarse trust in the estimate, one of 0.0, 0.3, 0.5, 0.7, 0.9
    pub confidence: f64,
}

impl MentalState {
    /// The state reported when total power is below [`MIN_TRUSTED_TOTAL_POWER`].
    pub const LOW_SIGNAL: MentalState = MentalState {
        stress_level: 0,
        focus_level: 0,
        sleepiness_level: 0,
        confidence: 0.0,
    };
}

/// Absolute band thresholds, in the same units as [`BandPowers`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub stress_beta_threshold: f64,
    pub stress_alpha_threshold: f64,
    pub focus_beta_min: f64,
    pub sleepy_delta_threshold: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            stress_beta_threshold: 15.0,
            stress_alpha_threshold: 8.0,
            focus_beta_min: 12.0,
            sleepy_delta_threshold: 10.0,
        }
    }
}

/// Which absolute band thresholds a window crosses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandIndicators {
    /// beta above `stress_beta_threshold`
    pub elevated_beta: bool,
    /// alpha below `stress_alpha_threshold`
    pub suppressed_alpha: bool,
    /// beta below `focus_beta_min`
    pub low_beta: bool,
    /// delta above `sleepy_delta_threshold`
    pub elevated_delta: bool,
}

/// Deterministic threshold classifier.
#[derive(Debug, Clone, Default)]
pub struct MentalStateClassifier {
    config: ClassifierConfig,
}

impl MentalStateClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify one window.
    pub fn classify(&self, powers: &BandPowers) -> MentalState {
        let total = powers.total();
        // NaN totals fall through here as well
        if !(total >= MIN_TRUSTED_TOTAL_POWER) {
            return MentalState::LOW_SIGNAL;
        }

        let pct = |power: f64| power / total * 100.0;
        let delta_pct = pct(powers.delta_power);
        let theta_pct = pct(powers.theta_power);
        let alpha_pct = pct(powers.alpha_power);
        let beta_pct = pct(powers.beta_power);
        let gamma_pct = pct(powers.gamma_power);

        MentalState {
            stress_level: stress_level(beta_pct, alpha_pct, gamma_pct),
            focus_level: focus_level(beta_pct, gamma_pct, alpha_pct),
            sleepiness_level: sleepiness_level(delta_pct, theta_pct, beta_pct),
            confidence: confidence(total),
        }
    }

    /// Compare absolute band means against the configured thresholds.
    pub fn indicators(&self, powers: &BandPowers) -> BandIndicators {
        BandIndicators {
            elevated_beta: powers.beta_power > self.config.stress_beta_threshold,
            suppressed_alpha: powers.alpha_power < self.config.stress_alpha_threshold,
            low_beta: powers.beta_power < self.config.focus_beta_min,
            elevated_delta: powers.delta_power > self.config.sleepy_delta_threshold,
        }
    }
}

fn stress_level(beta_pct: f64, alpha_pct: f64, gamma_pct: f64) -> u8 {
    let from_beta = (beta_pct * 3.0).min(100.0);
    let from_alpha = (50.0 - alpha_pct * 2.0).max(0.0);
    // Capped so gamma cannot dominate
    let from_gamma = (gamma_pct * 2.0).min(30.0);

    to_level((from_beta + from_alpha + from_gamma) / 2.5)
}

fn focus_level(beta_pct: f64, gamma_pct: f64, alpha_pct: f64) -> u8 {
    let from_beta = if (20.0..=35.0).contains(&beta_pct) {
        60.0
    } else if beta_pct > 35.0 {
        (beta_pct * 2.0).min(100.0)
    } else {
        beta_pct * 2.0
    };
    let from_gamma = (gamma_pct * 3.0).min(40.0);
    let alpha_penalty = ((alpha_pct - 30.0) * 0.5).max(0.0);

    to_level(from_beta + from_gamma - alpha_penalty)
}

fn sleepiness_level(delta_pct: f64, theta_pct: f64, beta_pct: f64) -> u8 {
    let from_slow_waves = (delta_pct * 2.0 + theta_pct * 1.5) / 2.0;
    let beta_shortfall = (30.0 - beta_pct).max(0.0);

    to_level(from_slow_waves + beta_shortfall)
}

/// Step function of total power. A coarse signal-strength proxy, not a statistical estimate.
fn confidence(total_power: f64) -> f64 {
    if total_power > 30.0 {
        0.9
    } else if total_power > 20.0 {
        0.7
    } else if total_power > 10.0 {
        0.5
    } else {
        0.3
    }
}

/// Clamp into 0..=100 and truncate towards zero.
fn to_level(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 100.0) as u8
}
