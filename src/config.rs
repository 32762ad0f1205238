//! Configuration for the Synheart EEG Agent.

use crate::core::classifier::ClassifierConfig;
use crate::core::recommendations::SelectorConfig;
use crate::simulator::types::Mode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for the agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Sampling, windowing and loop cadence
    pub stream: StreamConfig,

    /// Band thresholds used by the classifier
    pub classifier: ClassifierConfig,

    /// Level thresholds used by the recommendation selector
    pub selector: SelectorConfig,

    /// Where exported sessions and state are written
    pub storage: StorageConfig,
}

/// Sampling, windowing and loop timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Samples per second
    pub sampling_rate: u32,

    /// Length of each analysis window
    #[serde(with = "duration_serde")]
    pub window_duration: Duration,

    /// Span of samples retained after a window is taken
    #[serde(with = "duration_serde")]
    pub hop_duration: Duration,

    /// Loop tick interval; each tick generates this much signal
    #[serde(with = "duration_serde")]
    pub cadence: Duration,

    /// Sleep after a failed tick before resuming
    #[serde(with = "duration_serde")]
    pub error_backoff: Duration,

    /// Mode active when the agent starts
    pub initial_mode: Mode,

    /// Fixed RNG seed for reproducible runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sampling_rate: 256,
            window_duration: Duration::from_secs(2),
            hop_duration: Duration::from_secs(1),
            cadence: Duration::from_millis(250),
            error_backoff: Duration::from_secs(1),
            initial_mode: Mode::Relaxed,
            seed: None,
        }
    }
}

impl StreamConfig {
    /// Samples per analysis window (512 by default).
    pub fn window_len(&self) -> usize {
        crate::simulator::sample_count(self.sampling_rate, self.window_duration.as_secs_f64())
    }

    /// Samples retained between windows (256 by default).
    pub fn hop_len(&self) -> usize {
        crate::simulator::sample_count(self.sampling_rate, self.hop_duration.as_secs_f64())
    }

    /// Samples generated per loop tick (64 by default).
    pub fn samples_per_tick(&self) -> usize {
        crate::simulator::sample_count(self.sampling_rate, self.cadence.as_secs_f64())
    }

    /// Check that the derived lengths describe a usable pipeline.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sampling_rate == 0 {
            return Err(ConfigError::Invalid("sampling_rate must be positive".into()));
        }
        if self.window_len() == 0 {
            return Err(ConfigError::Invalid(
                "window_duration covers no samples".into(),
            ));
        }
        if self.hop_len() >= self.window_len() {
            return Err(ConfigError::Invalid(format!(
                "hop length ({}) must be smaller than window length ({})",
                self.hop_len(),
                self.window_len()
            )));
        }
        if self.samples_per_tick() == 0 {
            return Err(ConfigError::Invalid("cadence covers no samples".into()));
        }
        Ok(())
    }
}

/// Storage locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path for exported sessions
    pub export_path: PathBuf,

    /// Path for agent state (telemetry)
    pub data_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("synheart-eeg-agent");

        Self {
            export_path: data_dir.join("sessions"),
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific file, falling back to defaults when it is absent.
    pub fn load_from(config_path: &std::path::Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.stream.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("synheart-eeg-agent")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.storage.export_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        std::fs::create_dir_all(&self.storage.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration as fractional seconds.
mod duration_serde {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}
