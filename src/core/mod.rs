//! Core functionality for the Synheart EEG Agent.
//!
//! This module contains:
//! - Window buffering with overlap
//! - Band power aggregation per window
//! - Mental state classification
//! - Recommendation selection
//! - Data packet assembly

pub mod classifier;
pub mod features;
pub mod packet;
pub mod recommendations;
pub mod windowing;

// Re-export commonly used types
pub use classifier::{
    BandIndicators, ClassifierConfig, MentalState, MentalStateClassifier, MIN_TRUSTED_TOTAL_POWER,
};
pub use features::{aggregate, ratios, BandPowers, BandRatios};
pub use packet::{AnalysisError, DataPacket, PacketBuilder, PRODUCER_NAME};
pub use recommendations::{
    Recommendation, RecommendationEngine, RecommendationKind, SelectorConfig,
};
pub use windowing::{WindowBuffer, WindowSamples};
