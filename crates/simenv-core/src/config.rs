//! Environment configuration
//!
//! Loaded from TOML at startup, falls back to defaults if no config file
//! exists. Command-line flags are applied on top by the binary.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level environment configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimenvConfig {
    /// Where the memory service lives.
    pub memory: MemoryConfig,
    /// Worker behaviour.
    pub executor: ExecutorConfig,
    /// Parameters of the bundled temperature scenario.
    pub scenario: ScenarioConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MemoryConfig {
    pub host: String,
    pub port: u16,
    /// Per-request timeout in milliseconds. 0 disables the timeout.
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExecutorConfig {
    /// What a worker does once a poll has failed for good.
    pub on_failure: FailurePolicy,
    /// Retry schedule for fetching and reading the watched variable.
    pub retry: RetryConfig,
}

/// Retry schedule with exponential backoff.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per poll, including the first one. 1 disables retry.
    pub max_attempts: u32,
    pub base_ms: u64,
    pub multiplier: f64,
    pub max_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// The worker terminates. Sibling workers keep running.
    #[default]
    Stop,
    /// The failure is logged and the worker waits for its next poll.
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Rooms that get a convector trigger (`conv_<room>` driving `temp_<room>`).
    pub rooms: Vec<String>,
    /// Polling interval of each convector trigger, in seconds.
    pub interval_secs: f64,
}

// ============================================================
// Defaults
// ============================================================

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { host: "localhost".into(), port: 4000, timeout_ms: 0 }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 1, base_ms: 500, multiplier: 2.0, max_ms: 10_000 }
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self { rooms: vec!["S1".into(), "S2".into()], interval_secs: 10.0 }
    }
}

// ============================================================
// Loading
// ============================================================

impl SimenvConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(config) => {
                tracing::info!("Loaded config from {}", path.display());
                config
            }
            Err(crate::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config at {} - using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to load {}: {} - using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load config from a TOML file. Unlike `load`, errors are returned.
    pub fn try_load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Render the config as TOML (for generating a default config file).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

impl MemoryConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

impl RetryConfig {
    /// Wait before attempt `attempt + 1`, where `attempt` counts failed attempts so far (>= 1).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(32) as i32;
        let ms = (self.base_ms as f64 * self.multiplier.max(1.0).powi(exp)) as u64;
        Duration::from_millis(ms.min(self.max_ms))
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl ScenarioConfig {
    pub fn interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.interval_secs).unwrap_or_default()
    }
}

impl std::str::FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stop" => Ok(Self::Stop),
            "skip" => Ok(Self::Skip),
            other => Err(format!("unknown failure policy '{other}' (expected stop or skip)")),
        }
    }
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stop => write!(f, "stop"),
            Self::Skip => write!(f, "skip"),
        }
    }
}
