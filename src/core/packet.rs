//! Data packet assembly.
//!
//! A packet is the only externally visible output of the pipeline: one per completed window,
//! carrying the band means, the mental state estimate, the recommendations and the mode that
//! was active when the window's last batch was generated.

use crate::core::classifier::{MentalState, MentalStateClassifier};
use crate::core::features::{aggregate, BandPowers};
use crate::core::recommendations::{Recommendation, RecommendationEngine};
use crate::core::windowing::WindowSamples;
use crate::simulator::types::Mode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The name of this producer.
pub const PRODUCER_NAME: &str = "synheart-eeg-agent";

/// Output of one analysed window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPacket {
    /// Wall-clock time the packet was assembled
    pub timestamp: DateTime<Utc>,
    pub band_powers: BandPowers,
    pub mental_state: MentalState,
    pub recommendations: Vec<Recommendation>,
    pub current_mode: Mode,
}

/// Errors raised while turning a window into a packet.
#[derive(Debug)]
pub enum AnalysisError {
    /// The window's band means contain NaN or infinity
    NonFiniteBandPowers(BandPowers),
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::NonFiniteBandPowers(p) => {
                write!(f, "Non-finite band powers in window ending at {}", p.timestamp)
            }
        }
    }
}

impl std::error::Error for AnalysisError {}

/// Runs aggregation, classification and selection for a window.
pub struct PacketBuilder {
    instance_id: Uuid,
    classifier: MentalStateClassifier,
    engine: RecommendationEngine,
}

impl PacketBuilder {
    /// Create a builder with a unique instance ID.
    pub fn new(classifier: MentalStateClassifier, engine: RecommendationEngine) -> Self {
        Self {
            instance_id: Uuid::new_v4(),
            classifier,
            engine,
        }
    }

    /// Get the instance ID.
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn classifier(&self) -> &MentalStateClassifier {
        &self.classifier
    }

    pub fn engine(&self) -> &RecommendationEngine {
        &self.engine
    }

    /// Analyse a window and assemble its packet.
    pub fn build(&self, window: &WindowSamples, mode: Mode) -> Result<DataPacket, AnalysisError> {
        let band_powers = aggregate(window);
        if !band_powers.is_finite() {
            return Err(AnalysisError::NonFiniteBandPowers(band_powers));
        }

        let mental_state = self.classifier.classify(&band_powers);
        let recommendations = self.engine.select(&mental_state);

        Ok(DataPacket {
            timestamp: Utc::now(),
            band_powers,
            mental_state,
            recommendations,
            current_mode: mode,
        })
    }
}

impl Default for PacketBuilder {
    fn default() -> Self {
        Self::new(
            MentalStateClassifier::default(),
            RecommendationEngine::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::types::Sample;

    fn flat_window(value: f64, len: usize) -> WindowSamples {
        WindowSamples::new(
            (0..len)
                .map(|i| Sample::floored(i as f64 / 256.0, [value; 5]))
                .collect(),
        )
    }

    #[test]
    fn test_builder_instance_id() {
        assert_ne!(
            PacketBuilder::default().instance_id(),
            PacketBuilder::default().instance_id()
        );
    }

    #[test]
    fn test_build_packet() {
        let builder = PacketBuilder::default();
        let packet = builder.build(&flat_window(8.0, 512), Mode::Focused).unwrap();

        assert_eq!(packet.current_mode, Mode::Focused);
        assert!((packet.band_powers.beta_power - 8.0).abs() < 1e-9);
        assert_eq!(packet.band_powers.timestamp, 511.0 / 256.0);
        assert_eq!(packet.mental_state.confidence, 0.9);
        assert!(packet
            .recommendations
            .windows(2)
            .all(|w| w[0].priority <= w[1].priority));
    }

    #[test]
    fn test_empty_window_is_low_signal() {
        let packet = PacketBuilder::default()
            .build(&WindowSamples::new(Vec::new()), Mode::Relaxed)
            .unwrap();
        assert_eq!(packet.mental_state, MentalState::LOW_SIGNAL);
    }

    #[test]
    fn test_non_finite_window_rejected() {
        let window = WindowSamples::new(vec![Sample {
            timestamp: 0.0,
            delta: f64::INFINITY,
            theta: 1.0,
            alpha: 1.0,
            beta: 1.0,
            gamma: 1.0,
        }]);
        let result = PacketBuilder::default().build(&window, Mode::Relaxed);
        assert!(matches!(result, Err(AnalysisError::NonFiniteBandPowers(_))));
    }

    #[test]
    fn test_packet_json_fields() {
        let packet = PacketBuilder::default()
            .build(&flat_window(8.0, 16), Mode::Sleepy)
            .unwrap();
        let json = serde_json::to_value(&packet).unwrap();

        assert_eq!(json["current_mode"], "sleepy");
        assert!(json["band_powers"]["alpha_power"].is_number());
        assert!(json["mental_state"]["stress_level"].is_number());
        assert!(json["recommendations"].is_array());
        assert!(json["timestamp"].is_string());
    }
}
