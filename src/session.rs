//! Session history summaries and export.
//!
//! The stream controller keeps every packet of the current session in memory. This module
//! turns that history into a summary, or writes it to a [`SessionStore`].

use crate::core::packet::DataPacket;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::path::PathBuf;

/// Mean levels over a session, rounded to one decimal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelAverages {
    pub stress: f64,
    pub focus: f64,
    pub sleepiness: f64,
}

/// Summary of the session collected so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionSummary {
    /// No packets collected yet
    Empty,
    Active {
        count: usize,
        total_duration_seconds: f64,
        averages: LevelAverages,
    },
}

/// Summarise a packet history. Each packet accounts for one full window.
pub fn summarize(packets: &[DataPacket], window_duration_secs: f64) -> SessionSummary {
    if packets.is_empty() {
        return SessionSummary::Empty;
    }

    let level_mean = |level: fn(&DataPacket) -> u8| {
        round1(packets.iter().map(|p| level(p) as f64).mean())
    };

    SessionSummary::Active {
        count: packets.len(),
        total_duration_seconds: packets.len() as f64 * window_duration_secs,
        averages: LevelAverages {
            stress: level_mean(|p| p.mental_state.stress_level),
            focus: level_mean(|p| p.mental_state.focus_level),
            sleepiness: level_mean(|p| p.mental_state.sleepiness_level),
        },
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// On-disk layout of an exported session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Pretty-printed JSON array
    #[default]
    Json,
    /// One JSON packet per line
    Jsonl,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Jsonl => "jsonl",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "json" => Some(ExportFormat::Json),
            "jsonl" => Some(ExportFormat::Jsonl),
            _ => None,
        }
    }
}

/// Result of a successful export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportReceipt {
    /// Store-specific identifier (the file name for [`JsonFileStore`])
    pub identifier: String,
    /// Number of packets written
    pub count: usize,
}

/// Export errors. The in-memory history is never touched by a failed export.
#[derive(Debug)]
pub enum ExportError {
    Io(String),
    Serialize(String),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Io(e) => write!(f, "Could not write session: {e}"),
            ExportError::Serialize(e) => write!(f, "Could not serialize session: {e}"),
        }
    }
}

impl std::error::Error for ExportError {}

/// Durable destination for session history.
pub trait SessionStore: Send + Sync {
    fn persist(&self, packets: &[DataPacket]) -> Result<ExportReceipt, ExportError>;
}

/// Writes each export to a new timestamped file in a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
    format: ExportFormat,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            format: ExportFormat::Json,
        }
    }

    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.format = format;
        self
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    /// File name for a new export, unique even within the same second.
    fn next_file_name(&self) -> String {
        format!(
            "session_{}_{}.{}",
            Utc::now().format("%Y%m%d_%H%M%S"),
            &uuid::Uuid::new_v4().simple().to_string()[..8],
            self.format.extension()
        )
    }

    fn encode(&self, packets: &[DataPacket]) -> Result<String, ExportError> {
        match self.format {
            ExportFormat::Json => serde_json::to_string_pretty(packets)
                .map_err(|e| ExportError::Serialize(e.to_string())),
            ExportFormat::Jsonl => {
                let lines = packets
                    .iter()
                    .map(serde_json::to_string)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| ExportError::Serialize(e.to_string()))?;
                Ok(lines.join("\n"))
            }
        }
    }
}

impl SessionStore for JsonFileStore {
    fn persist(&self, packets: &[DataPacket]) -> Result<ExportReceipt, ExportError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| ExportError::Io(e.to_string()))?;

        let contents = self.encode(packets)?;
        let file_name = self.next_file_name();
        std::fs::write(self.dir.join(&file_name), contents)
            .map_err(|e| ExportError::Io(e.to_string()))?;

        Ok(ExportReceipt {
            identifier: file_name,
            count: packets.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classifier::MentalState;
    use crate::core::features::BandPowers;
    use crate::simulator::types::Mode;

    fn packet(stress: u8, focus: u8, sleepiness: u8) -> DataPacket {
        DataPacket {
            timestamp: Utc::now(),
            band_powers: BandPowers::default(),
            mental_state: MentalState {
                stress_level: stress,
                focus_level: focus,
                sleepiness_level: sleepiness,
                confidence: 0.9,
            },
            recommendations: Vec::new(),
            current_mode: Mode::Relaxed,
        }
    }

    fn temp_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("synheart-eeg-{tag}-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_summary_empty_is_distinct() {
        let summary = summarize(&[], 2.0);
        assert_eq!(summary, SessionSummary::Empty);
        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            serde_json::json!({ "status": "empty" })
        );
    }

    #[test]
    fn test_summary_averages() {
        let packets = vec![packet(10, 50, 20), packet(20, 61, 30), packet(31, 40, 25)];
        let summary = summarize(&packets, 2.0);

        assert_eq!(
            summary,
            SessionSummary::Active {
                count: 3,
                total_duration_seconds: 6.0,
                averages: LevelAverages {
                    stress: 20.3,
                    focus: 50.3,
                    sleepiness: 25.0,
                },
            }
        );
    }

    #[test]
    fn test_json_export() {
        let dir = temp_dir("export");
        let store = JsonFileStore::new(&dir);
        let packets = vec![packet(10, 50, 20), packet(20, 60, 30)];

        let receipt = store.persist(&packets).unwrap();
        assert_eq!(receipt.count, 2);
        assert!(receipt.identifier.starts_with("session_"));
        assert!(receipt.identifier.ends_with(".json"));

        let content = std::fs::read_to_string(dir.join(&receipt.identifier)).unwrap();
        let parsed: Vec<DataPacket> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].mental_state.focus_level, 60);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_jsonl_export() {
        let dir = temp_dir("export-jsonl");
        let store = JsonFileStore::new(&dir).with_format(ExportFormat::Jsonl);
        let receipt = store.persist(&[packet(1, 2, 3), packet(4, 5, 6)]).unwrap();

        let content = std::fs::read_to_string(dir.join(&receipt.identifier)).unwrap();
        assert_eq!(content.lines().count(), 2);
        for line in content.lines() {
            serde_json::from_str::<DataPacket>(line).unwrap();
        }

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_export_failure_reported() {
        // A regular file where the export directory should be
        let blocker = temp_dir("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let result = JsonFileStore::new(&blocker).persist(&[packet(1, 2, 3)]);
        assert!(matches!(result, Err(ExportError::Io(_))));

        let _ = std::fs::remove_file(&blocker);
    }

    #[test]
    fn test_export_format_names() {
        assert_eq!(ExportFormat::parse("jsonl"), Some(ExportFormat::Jsonl));
        assert_eq!(ExportFormat::parse("csv"), None);
    }
}
