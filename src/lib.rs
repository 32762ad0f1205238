//! Synheart EEG Agent - simulated EEG stream to mental-state estimates.
//!
//! This library generates synthetic five-band EEG power samples, slices them into overlapping
//! windows, estimates stress, focus and sleepiness from each window, and attaches wellness
//! recommendations to the estimate.
//!
//! Nothing here is a medical device. The generator, band profiles and thresholds are
//! illustrative.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                       Synheart EEG Agent                         │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌───────────┐   ┌────────────┐   ┌───────────┐  │
//! │  │ Generator │──▶│ Windowing │──▶│ Aggregator │──▶│Classifier │  │
//! │  │ (256 Hz)  │   │ (2s / 1s) │   │ (band mean)│   │  (levels) │  │
//! │  └───────────┘   └───────────┘   └────────────┘   └───────────┘  │
//! │        ▲                                                │        │
//! │        │ mode                                           ▼        │
//! │  ┌───────────┐   ┌───────────┐                   ┌────────────┐  │
//! │  │  Stream   │◀──│  Packet   │◀──────────────────│ Recommend- │  │
//! │  │ Controller│──▶│   Sink    │                   │   ations   │  │
//! │  └───────────┘   └───────────┘                   └────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use synheart_eeg_agent::{ChannelSink, Config, PacketBuilder, SampleGenerator, StreamLoop};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let (sink, packets) = ChannelSink::bounded(16);
//! let stream = StreamLoop::new(
//!     config.stream.clone(),
//!     PacketBuilder::default(),
//!     SampleGenerator::new(config.stream.sampling_rate),
//!     sink,
//! )?;
//!
//! let (handle, _task) = stream.spawn();
//! handle.set_mode("focused")?;
//! handle.start();
//!
//! // Packets arrive on `packets` once per hop after the first window fills
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod session;
pub mod simulator;
pub mod stream;
pub mod telemetry;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use config::{Config, StreamConfig};
pub use core::{
    BandPowers, DataPacket, MentalState, MentalStateClassifier, PacketBuilder, Recommendation,
    RecommendationEngine, WindowBuffer,
};
pub use session::{ExportFormat, JsonFileStore, SessionStore, SessionSummary};
pub use simulator::{Mode, Sample, SampleGenerator, SampleSource};
pub use stream::{ChannelSink, ControlError, NullSink, PacketSink, StreamHandle, StreamLoop};
pub use telemetry::{PipelineTelemetry, SharedTelemetry, TelemetryStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Notice shown by the CLI before streaming.
pub const SIMULATION_NOTICE: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║                SYNHEART EEG AGENT - SIMULATED DATA               ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  All band powers are synthetic. No headset is read.              ║
║                                                                  ║
║  Mental-state levels and recommendations come from fixed         ║
║  heuristics and are not a diagnosis of any kind.                 ║
║                                                                  ║
║  Session history stays in memory until you export it.            ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
