//! EEG simulation module for the Synheart EEG Agent.
//!
//! Produces band-power samples shaped by a target [`Mode`]. The stream loop consumes samples
//! through the [`SampleSource`] trait so other sources can be swapped in.

pub mod generator;
pub mod types;

// Re-export commonly used types
pub use generator::{sample_count, SampleGenerator, SampleSource, SampleStream, SourceError};
pub use types::{BandProfile, Mode, Sample, POWER_FLOOR};
