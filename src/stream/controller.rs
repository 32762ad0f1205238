//! Cadence-driven stream controller.
//!
//! One background task owns the sample source, the window buffer and the analysis pipeline.
//! Every tick it either idles or generates one cadence interval of samples, and when a window
//! completes it runs aggregation, classification and selection, then hands the packet to the
//! sink and appends it to the session history.
//!
//! Commands from other contexts go through a cloneable [`StreamHandle`]. The handle and the
//! loop share one mutex around the streaming flag, active mode, buffer fill and history. The
//! lock is only held for single field reads and writes, never across window analysis.

use crate::config::{ConfigError, StreamConfig};
use crate::core::packet::{AnalysisError, DataPacket, PacketBuilder};
use crate::core::windowing::WindowBuffer;
use crate::session::{summarize, ExportError, ExportReceipt, SessionStore, SessionSummary};
use crate::simulator::generator::{SampleSource, SourceError};
use crate::simulator::types::Mode;
use crate::stream::sink::PacketSink;
use crate::telemetry::{PipelineTelemetry, SharedTelemetry};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Errors returned to command callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// The requested mode name is not one of relaxed, focused, stressed, sleepy
    UnknownMode(String),
}

impl std::fmt::Display for ControlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlError::UnknownMode(name) => write!(f, "Unknown mode: {name:?}"),
        }
    }
}

impl std::error::Error for ControlError {}

/// A failed loop tick. Caught by the loop, never propagated.
#[derive(Debug)]
pub enum TickError {
    Source(SourceError),
    Analysis(AnalysisError),
}

impl std::fmt::Display for TickError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TickError::Source(e) => write!(f, "{e}"),
            TickError::Analysis(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for TickError {}

impl From<SourceError> for TickError {
    fn from(e: SourceError) -> Self {
        TickError::Source(e)
    }
}

impl From<AnalysisError> for TickError {
    fn from(e: AnalysisError) -> Self {
        TickError::Analysis(e)
    }
}

/// What one successful tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Not streaming, nothing generated
    Idle,
    /// Samples generated, window not yet complete
    Buffering { buffer_fill: usize },
    /// A window completed and this packet was emitted
    Emitted(DataPacket),
}

/// Point-in-time view of the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamStatus {
    pub streaming: bool,
    pub active_mode: Mode,
    pub buffer_fill: usize,
    pub session_length: usize,
}

/// State shared between the loop and command handlers.
#[derive(Debug)]
struct ControlState {
    streaming: bool,
    mode: Mode,
    buffer_fill: usize,
    history: Vec<DataPacket>,
}

/// Cloneable command and query interface to a running stream loop.
#[derive(Debug, Clone)]
pub struct StreamHandle {
    state: Arc<Mutex<ControlState>>,
    telemetry: SharedTelemetry,
    window_duration_secs: f64,
}

impl StreamHandle {
    fn new(initial_mode: Mode, window_duration_secs: f64, telemetry: SharedTelemetry) -> Self {
        Self {
            state: Arc::new(Mutex::new(ControlState {
                streaming: false,
                mode: initial_mode,
                buffer_fill: 0,
                history: Vec::new(),
            })),
            telemetry,
            window_duration_secs,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControlState> {
        // State stays consistent field by field, so a poisoned lock is still usable
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Begin generating samples on the next tick.
    pub fn start(&self) {
        let mut state = self.lock();
        if !state.streaming {
            state.streaming = true;
            tracing::info!(mode = %state.mode, "Streaming started");
        }
    }

    /// Stop generating from the next tick on. A window already being analysed still emits.
    pub fn stop(&self) {
        let mut state = self.lock();
        if state.streaming {
            state.streaming = false;
            tracing::info!("Streaming stopped");
        }
    }

    /// Switch the simulated mode. Unknown names are rejected and nothing changes.
    pub fn set_mode(&self, name: &str) -> Result<Mode, ControlError> {
        let mode = Mode::parse(name).ok_or_else(|| {
            tracing::warn!(requested = name, "Rejected unknown mode");
            ControlError::UnknownMode(name.to_string())
        })?;

        let mut state = self.lock();
        if state.mode != mode {
            tracing::info!(from = %state.mode, to = %mode, "Mode changed");
            state.mode = mode;
        }
        Ok(mode)
    }

    pub fn mode(&self) -> Mode {
        self.lock().mode
    }

    pub fn is_streaming(&self) -> bool {
        self.lock().streaming
    }

    pub fn status(&self) -> StreamStatus {
        let state = self.lock();
        StreamStatus {
            streaming: state.streaming,
            active_mode: state.mode,
            buffer_fill: state.buffer_fill,
            session_length: state.history.len(),
        }
    }

    /// Copy of the session history, oldest first.
    pub fn history(&self) -> Vec<DataPacket> {
        self.lock().history.clone()
    }

    /// Most recently emitted packet of this session.
    pub fn latest_packet(&self) -> Option<DataPacket> {
        self.lock().history.last().cloned()
    }

    /// Reset the session history to empty.
    pub fn clear_session(&self) {
        let cleared = std::mem::take(&mut self.lock().history);
        tracing::info!(packets = cleared.len(), "Session cleared");
    }

    pub fn session_summary(&self) -> SessionSummary {
        let history = self.history();
        summarize(&history, self.window_duration_secs)
    }

    /// Write the current history to `store`. History stays in memory either way.
    pub fn export_session(&self, store: &dyn SessionStore) -> Result<ExportReceipt, ExportError> {
        let history = self.history();
        match store.persist(&history) {
            Ok(receipt) => {
                self.telemetry.record_session_exported();
                tracing::info!(
                    identifier = %receipt.identifier,
                    count = receipt.count,
                    "Session exported"
                );
                Ok(receipt)
            }
            Err(e) => {
                tracing::error!("Session export failed: {e}");
                Err(e)
            }
        }
    }

    pub fn telemetry(&self) -> &SharedTelemetry {
        &self.telemetry
    }

    fn tick_snapshot(&self) -> (bool, Mode) {
        let state = self.lock();
        (state.streaming, state.mode)
    }

    fn publish_buffer_fill(&self, fill: usize) {
        self.lock().buffer_fill = fill;
    }

    fn append_packet(&self, packet: DataPacket) {
        self.lock().history.push(packet);
    }
}

/// The background loop. Owns the source, buffer and pipeline exclusively.
pub struct StreamLoop<S: SampleSource, D: PacketSink> {
    config: StreamConfig,
    source: S,
    buffer: WindowBuffer,
    builder: PacketBuilder,
    sink: D,
    handle: StreamHandle,
}

impl<S: SampleSource, D: PacketSink> StreamLoop<S, D> {
    /// Build a loop from a validated stream configuration.
    pub fn new(
        config: StreamConfig,
        builder: PacketBuilder,
        source: S,
        sink: D,
    ) -> Result<Self, ConfigError> {
        Self::with_telemetry(config, builder, source, sink, Arc::new(PipelineTelemetry::new()))
    }

    /// Build a loop that records into existing telemetry.
    pub fn with_telemetry(
        config: StreamConfig,
        builder: PacketBuilder,
        source: S,
        sink: D,
        telemetry: SharedTelemetry,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let handle = StreamHandle::new(
            config.initial_mode,
            config.window_duration.as_secs_f64(),
            telemetry,
        );
        let buffer = WindowBuffer::new(config.window_len(), config.hop_len());

        Ok(Self {
            config,
            source,
            buffer,
            builder,
            sink,
            handle,
        })
    }

    /// A handle for issuing commands to this loop.
    pub fn handle(&self) -> StreamHandle {
        self.handle.clone()
    }

    /// Samples currently buffered.
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// Run one loop iteration.
    pub fn tick(&mut self) -> Result<TickOutcome, TickError> {
        let (streaming, mode) = self.handle.tick_snapshot();
        if !streaming {
            return Ok(TickOutcome::Idle);
        }

        let outcome = self.advance(mode);
        self.handle.publish_buffer_fill(self.buffer.len());
        outcome
    }

    fn advance(&mut self, mode: Mode) -> Result<TickOutcome, TickError> {
        let batch = self
            .source
            .next_batch(mode, self.config.cadence.as_secs_f64())?;
        self.handle.telemetry.record_samples(batch.len() as u64);
        self.buffer.extend(batch);

        let Some(window) = self.buffer.take_window() else {
            return Ok(TickOutcome::Buffering {
                buffer_fill: self.buffer.len(),
            });
        };

        self.handle.telemetry.record_window();
        let packet = self.builder.build(&window, mode)?;

        tracing::debug!(
            mode = %mode,
            stress = packet.mental_state.stress_level,
            focus = packet.mental_state.focus_level,
            sleepiness = packet.mental_state.sleepiness_level,
            confidence = packet.mental_state.confidence,
            recommendations = packet.recommendations.len(),
            "Window analyzed"
        );

        if self.sink.deliver(&packet) {
            self.handle.telemetry.record_packet_delivered();
        }
        self.handle.append_packet(packet.clone());

        Ok(TickOutcome::Emitted(packet))
    }

    /// Run until the process ends.
    pub async fn run(self) {
        self.run_until(std::future::pending()).await
    }

    /// Run until `shutdown` resolves. Failed ticks are logged and followed by the configured
    /// backoff; they never end the loop.
    pub async fn run_until<F: Future<Output = ()>>(mut self, shutdown: F) {
        tokio::pin!(shutdown);
        tracing::info!(
            sampling_rate = self.config.sampling_rate,
            window = self.config.window_len(),
            hop = self.config.hop_len(),
            "Stream loop running"
        );

        loop {
            let pause = match self.tick() {
                Ok(_) => self.config.cadence,
                Err(e) => {
                    self.handle.telemetry.record_tick_failure();
                    tracing::error!(
                        backoff_secs = self.config.error_backoff.as_secs_f64(),
                        "Stream tick failed: {e}"
                    );
                    self.config.error_backoff
                }
            };

            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        tracing::info!("Stream loop stopped");
    }
}

impl<S, D> StreamLoop<S, D>
where
    S: SampleSource + 'static,
    D: PacketSink + 'static,
{
    /// Spawn the loop on the current tokio runtime.
    pub fn spawn(self) -> (StreamHandle, tokio::task::JoinHandle<()>) {
        let handle = self.handle();
        let task = tokio::spawn(self.run());
        (handle, task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::JsonFileStore;
    use crate::simulator::generator::SampleGenerator;
    use crate::simulator::types::Sample;
    use crate::stream::sink::{ChannelSink, NullSink};

    fn test_loop() -> StreamLoop<SampleGenerator, NullSink> {
        StreamLoop::new(
            StreamConfig::default(),
            PacketBuilder::default(),
            SampleGenerator::with_seed(256, 11),
            NullSink,
        )
        .unwrap()
    }

    struct BrokenSource;

    impl SampleSource for BrokenSource {
        fn next_batch(&mut self, _: Mode, _: f64) -> Result<Vec<Sample>, SourceError> {
            Err(SourceError::Unavailable("unplugged".into()))
        }
    }

    #[test]
    fn test_idle_tick_generates_nothing() {
        let mut stream = test_loop();
        assert_eq!(stream.tick().unwrap(), TickOutcome::Idle);
        assert_eq!(stream.buffer_len(), 0);
        assert_eq!(stream.handle().status().buffer_fill, 0);
    }

    #[test]
    fn test_emits_on_eighth_tick_then_every_fourth() {
        let mut stream = test_loop();
        let handle = stream.handle();
        handle.start();

        let mut emitted_at = Vec::new();
        for tick in 1..=16 {
            if let TickOutcome::Emitted(_) = stream.tick().unwrap() {
                emitted_at.push(tick);
            }
        }

        assert_eq!(emitted_at, vec![8, 12, 16]);
        let status = handle.status();
        assert_eq!(status.session_length, 3);
        assert_eq!(status.buffer_fill, 256);
    }

    #[test]
    fn test_buffer_fill_published() {
        let mut stream = test_loop();
        let handle = stream.handle();
        handle.start();

        stream.tick().unwrap();
        stream.tick().unwrap();
        assert_eq!(handle.status().buffer_fill, 128);
    }

    #[test]
    fn test_unknown_mode_leaves_state_unchanged() {
        let stream = test_loop();
        let handle = stream.handle();
        handle.start();
        handle.set_mode("sleepy").unwrap();

        let before = handle.status();
        let err = handle.set_mode("invalid").unwrap_err();

        assert_eq!(err, ControlError::UnknownMode("invalid".into()));
        assert_eq!(handle.status(), before);
    }

    #[test]
    fn test_mode_change_applies_to_next_batch() {
        let (sink, receiver) = ChannelSink::bounded(8);
        let mut stream = StreamLoop::new(
            StreamConfig::default(),
            PacketBuilder::default(),
            SampleGenerator::with_seed(256, 2),
            sink,
        )
        .unwrap();
        let handle = stream.handle();
        handle.start();

        for _ in 0..7 {
            stream.tick().unwrap();
        }
        handle.set_mode("stressed").unwrap();
        stream.tick().unwrap();

        let packet = receiver.try_recv().unwrap();
        assert_eq!(packet.current_mode, Mode::Stressed);
    }

    #[test]
    fn test_stop_prevents_generation() {
        let mut stream = test_loop();
        let handle = stream.handle();
        handle.start();
        stream.tick().unwrap();
        handle.stop();

        assert_eq!(stream.tick().unwrap(), TickOutcome::Idle);
        assert_eq!(stream.buffer_len(), 64);
    }

    #[test]
    fn test_source_failure_is_a_tick_error() {
        let mut stream = StreamLoop::new(
            StreamConfig::default(),
            PacketBuilder::default(),
            BrokenSource,
            NullSink,
        )
        .unwrap();
        stream.handle().start();

        assert!(matches!(stream.tick(), Err(TickError::Source(_))));
    }

    #[test]
    fn test_clear_session() {
        let mut stream = test_loop();
        let handle = stream.handle();
        handle.start();
        for _ in 0..8 {
            stream.tick().unwrap();
        }
        assert_eq!(handle.status().session_length, 1);
        assert!(handle.latest_packet().is_some());

        handle.clear_session();
        assert_eq!(handle.status().session_length, 0);
        assert_eq!(handle.session_summary(), SessionSummary::Empty);
    }

    #[test]
    fn test_failed_export_keeps_history() {
        let mut stream = test_loop();
        let handle = stream.handle();
        handle.start();
        for _ in 0..8 {
            stream.tick().unwrap();
        }

        let blocker = std::env::temp_dir()
            .join(format!("synheart-eeg-export-blocker-{}", uuid::Uuid::new_v4()));
        std::fs::write(&blocker, b"file").unwrap();

        let result = handle.export_session(&JsonFileStore::new(&blocker));
        assert!(result.is_err());
        assert_eq!(handle.history().len(), 1);
        assert_eq!(handle.telemetry().stats().sessions_exported, 0);

        let _ = std::fs::remove_file(&blocker);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = StreamConfig {
            sampling_rate: 0,
            ..StreamConfig::default()
        };
        let result = StreamLoop::new(
            config,
            PacketBuilder::default(),
            SampleGenerator::new(256),
            NullSink,
        );
        assert!(result.is_err());
    }
}
