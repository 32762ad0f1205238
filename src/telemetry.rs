//! Pipeline counters.
//!
//! Lock-free counters updated by the stream loop and session operations, readable from any
//! context. Counters can be persisted so cumulative totals survive restarts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for the current run.
#[derive(Debug)]
pub struct PipelineTelemetry {
    /// Samples pulled from the source
    samples_generated: AtomicU64,
    /// Windows that reached the analysis step
    windows_analyzed: AtomicU64,
    /// Packets handed to the delivery sink
    packets_delivered: AtomicU64,
    /// Ticks that failed and triggered a backoff
    tick_failures: AtomicU64,
    /// Successful session exports
    sessions_exported: AtomicU64,
    /// Run start time
    started_at: DateTime<Utc>,
    /// Path for persisting counters
    persist_path: Option<PathBuf>,
}

impl PipelineTelemetry {
    pub fn new() -> Self {
        Self {
            samples_generated: AtomicU64::new(0),
            windows_analyzed: AtomicU64::new(0),
            packets_delivered: AtomicU64::new(0),
            tick_failures: AtomicU64::new(0),
            sessions_exported: AtomicU64::new(0),
            started_at: Utc::now(),
            persist_path: None,
        }
    }

    /// Create counters that load from and save to `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut telemetry = Self::new();
        telemetry.persist_path = Some(path);

        if let Err(e) = telemetry.load() {
            tracing::warn!("Could not load previous telemetry: {e}");
        }

        telemetry
    }

    pub fn record_samples(&self, count: u64) {
        self.samples_generated.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_window(&self) {
        self.windows_analyzed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_packet_delivered(&self) {
        self.packets_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tick_failure(&self) {
        self.tick_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_exported(&self) {
        self.sessions_exported.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current counters.
    pub fn stats(&self) -> TelemetryStats {
        TelemetryStats {
            samples_generated: self.samples_generated.load(Ordering::Relaxed),
            windows_analyzed: self.windows_analyzed.load(Ordering::Relaxed),
            packets_delivered: self.packets_delivered.load(Ordering::Relaxed),
            tick_failures: self.tick_failures.load(Ordering::Relaxed),
            sessions_exported: self.sessions_exported.load(Ordering::Relaxed),
            started_at: self.started_at,
            uptime_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Pipeline Statistics:\n\
             - Samples generated: {}\n\
             - Windows analyzed: {}\n\
             - Packets delivered: {}\n\
             - Failed ticks: {}\n\
             - Sessions exported: {}\n\
             - Uptime: {} seconds",
            stats.samples_generated,
            stats.windows_analyzed,
            stats.packets_delivered,
            stats.tick_failures,
            stats.sessions_exported,
            stats.uptime_secs
        )
    }

    /// Save counters to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                samples_generated: stats.samples_generated,
                windows_analyzed: stats.windows_analyzed,
                packets_delivered: stats.packets_delivered,
                tick_failures: stats.tick_failures,
                sessions_exported: stats.sessions_exported,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.samples_generated
                    .store(persisted.samples_generated, Ordering::Relaxed);
                self.windows_analyzed
                    .store(persisted.windows_analyzed, Ordering::Relaxed);
                self.packets_delivered
                    .store(persisted.packets_delivered, Ordering::Relaxed);
                self.tick_failures
                    .store(persisted.tick_failures, Ordering::Relaxed);
                self.sessions_exported
                    .store(persisted.sessions_exported, Ordering::Relaxed);
            }
        }
        Ok(())
    }
}

impl Default for PipelineTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of pipeline counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryStats {
    pub samples_generated: u64,
    pub windows_analyzed: u64,
    pub packets_delivered: u64,
    pub tick_failures: u64,
    pub sessions_exported: u64,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    samples_generated: u64,
    windows_analyzed: u64,
    packets_delivered: u64,
    tick_failures: u64,
    sessions_exported: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared telemetry.
pub type SharedTelemetry = Arc<PipelineTelemetry>;
