//! Feature computation from sample windows.
//!
//! A window is reduced to the arithmetic mean of each band. This is a plain average of
//! already band-separated power, not a spectral transform.

use crate::core::windowing::WindowSamples;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Floor applied to alpha and beta before they are used as ratio denominators.
const RATIO_DENOMINATOR_FLOOR: f64 = 0.1;

/// Mean band power over one window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BandPowers {
    pub delta_power: f64,
    pub theta_power: f64,
    pub alpha_power: f64,
    pub beta_power: f64,
    pub gamma_power: f64,
    /// Timestamp of the last sample in the window (as-of time)
    pub timestamp: f64,
}

impl BandPowers {
    /// Sum of the five band means.
    pub fn total(&self) -> f64 {
        self.delta_power + self.theta_power + self.alpha_power + self.beta_power + self.gamma_power
    }

    /// Whether every field is a finite number.
    pub fn is_finite(&self) -> bool {
        [
            self.delta_power,
            self.theta_power,
            self.alpha_power,
            self.beta_power,
            self.gamma_power,
            self.timestamp,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Diagnostic ratios derived from band powers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BandRatios {
    /// Elevated values point towards stress
    pub beta_alpha_ratio: f64,
    /// Elevated values point towards drowsiness
    pub theta_beta_ratio: f64,
    pub total_power: f64,
}

/// Reduce a window to per-band mean powers.
///
/// An empty window yields all-zero powers with timestamp 0.0.
pub fn aggregate(window: &WindowSamples) -> BandPowers {
    let samples = window.samples();
    let Some(last) = samples.last() else {
        return BandPowers::default();
    };

    BandPowers {
        delta_power: samples.iter().map(|s| s.delta).mean(),
        theta_power: samples.iter().map(|s| s.theta).mean(),
        alpha_power: samples.iter().map(|s| s.alpha).mean(),
        beta_power: samples.iter().map(|s| s.beta).mean(),
        gamma_power: samples.iter().map(|s| s.gamma).mean(),
        timestamp: last.timestamp,
    }
}

/// Compute diagnostic ratios. Zero total power reports both ratios as 0.
pub fn ratios(powers: &BandPowers) -> BandRatios {
    let total_power = powers.total();
    if total_power == 0.0 {
        return BandRatios::default();
    }

    let alpha = powers.alpha_power.max(RATIO_DENOMINATOR_FLOOR);
    let beta = powers.beta_power.max(RATIO_DENOMINATOR_FLOOR);

    BandRatios {
        beta_alpha_ratio: beta / alpha,
        theta_beta_ratio: powers.theta_power / beta,
        total_power,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::types::Sample;

    fn window(values: &[[f64; 5]]) -> WindowSamples {
        WindowSamples::new(
            values
                .iter()
                .enumerate()
                .map(|(i, bands)| Sample::floored(i as f64 * 0.5, *bands))
                .collect(),
        )
    }

    #[test]
    fn test_aggregate_empty() {
        let powers = aggregate(&WindowSamples::new(Vec::new()));
        assert_eq!(powers, BandPowers::default());
        assert_eq!(powers.timestamp, 0.0);
    }

    #[test]
    fn test_aggregate_means_and_end_time() {
        let powers = aggregate(&window(&[
            [1.0, 2.0, 3.0, 4.0, 5.0],
            [3.0, 4.0, 5.0, 6.0, 7.0],
        ]));

        assert!((powers.delta_power - 2.0).abs() < 1e-12);
        assert!((powers.theta_power - 3.0).abs() < 1e-12);
        assert!((powers.alpha_power - 4.0).abs() < 1e-12);
        assert!((powers.beta_power - 5.0).abs() < 1e-12);
        assert!((powers.gamma_power - 6.0).abs() < 1e-12);
        assert_eq!(powers.timestamp, 0.5);
        assert!((powers.total() - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_ratios_zero_total() {
        let ratios = ratios(&BandPowers::default());
        assert_eq!(ratios.beta_alpha_ratio, 0.0);
        assert_eq!(ratios.theta_beta_ratio, 0.0);
        assert_eq!(ratios.total_power, 0.0);
    }

    #[test]
    fn test_ratios_floor_denominators() {
        let powers = BandPowers {
            delta_power: 1.0,
            theta_power: 2.0,
            alpha_power: 0.0,
            beta_power: 0.01,
            gamma_power: 0.0,
            timestamp: 1.0,
        };
        let r = ratios(&powers);

        // beta floored to 0.1, alpha floored to 0.1
        assert!((r.beta_alpha_ratio - 1.0).abs() < 1e-12);
        assert!((r.theta_beta_ratio - 20.0).abs() < 1e-12);
        assert!((r.total_power - 3.01).abs() < 1e-12);
    }

    #[test]
    fn test_ratios_typical() {
        let powers = BandPowers {
            delta_power: 4.0,
            theta_power: 6.0,
            alpha_power: 4.0,
            beta_power: 20.0,
            gamma_power: 12.0,
            timestamp: 2.0,
        };
        let r = ratios(&powers);
        assert!((r.beta_alpha_ratio - 5.0).abs() < 1e-12);
        assert!((r.theta_beta_ratio - 0.3).abs() < 1e-12);
        assert!((r.total_power - 46.0).abs() < 1e-12);
    }
}
