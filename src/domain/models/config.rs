use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::errors::ConfigError;

/// Upper bound for `max_concurrent`
pub const MAX_CONCURRENT_LIMIT: usize = 1024;

/// Top-level configuration for the `batchq` binary and embedders
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    /// Processor tunables
    #[serde(default)]
    pub processor: ProcessorConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backoff growth between retry attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryStrategy {
    /// `retry_delay * 2^(attempt - 1)`
    Exponential,
    /// `retry_delay * attempt`
    Linear,
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::Exponential
    }
}

/// Processor tunables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessorConfig {
    /// Maximum in-flight handler invocations (1-1024)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    #[serde(default)]
    pub retry_strategy: RetryStrategy,

    /// Default retry budget for new tasks
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff delay in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Cap on the computed backoff delay in milliseconds
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,

    /// Per-task handler timeout in milliseconds; `None` disables it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Dispatch by priority tier (FIFO within a tier) instead of strict FIFO
    #[serde(default = "default_true")]
    pub priority_enabled: bool,

    /// Start dispatching as soon as the processor is constructed
    #[serde(default)]
    pub auto_start: bool,

    /// Write a final snapshot when the processor stops
    #[serde(default)]
    pub persist_state: bool,

    /// Snapshot location
    #[serde(default = "default_state_file_path")]
    pub state_file_path: PathBuf,
}

const fn default_max_concurrent() -> usize {
    3
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_retry_delay_ms() -> u64 {
    1_000
}

const fn default_max_retry_delay_ms() -> u64 {
    60_000
}

const fn default_true() -> bool {
    true
}

fn default_state_file_path() -> PathBuf {
    PathBuf::from(".batchq/state.json")
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            retry_strategy: RetryStrategy::default(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
            timeout_ms: None,
            priority_enabled: default_true(),
            auto_start: false,
            persist_state: false,
            state_file_path: default_state_file_path(),
        }
    }
}

impl ProcessorConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Shallow merge: every field set in `update` replaces the current value.
    pub fn merged(&self, update: &ConfigUpdate) -> Self {
        Self {
            max_concurrent: update.max_concurrent.unwrap_or(self.max_concurrent),
            retry_strategy: update.retry_strategy.unwrap_or(self.retry_strategy),
            max_retries: update.max_retries.unwrap_or(self.max_retries),
            retry_delay_ms: update.retry_delay_ms.unwrap_or(self.retry_delay_ms),
            max_retry_delay_ms: update.max_retry_delay_ms.unwrap_or(self.max_retry_delay_ms),
            timeout_ms: update.timeout_ms.unwrap_or(self.timeout_ms),
            priority_enabled: update.priority_enabled.unwrap_or(self.priority_enabled),
            auto_start: update.auto_start.unwrap_or(self.auto_start),
            persist_state: update.persist_state.unwrap_or(self.persist_state),
            state_file_path: update
                .state_file_path
                .clone()
                .unwrap_or_else(|| self.state_file_path.clone()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent == 0 || self.max_concurrent > MAX_CONCURRENT_LIMIT {
            return Err(ConfigError::InvalidMaxConcurrent(self.max_concurrent));
        }

        if self.retry_delay_ms > self.max_retry_delay_ms {
            return Err(ConfigError::InvalidRetryDelay(
                self.retry_delay_ms,
                self.max_retry_delay_ms,
            ));
        }

        if self.timeout_ms == Some(0) {
            return Err(ConfigError::ZeroTimeout);
        }

        if self.persist_state && self.state_file_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyStateFilePath);
        }

        Ok(())
    }
}

/// Partial configuration for `update_config`.
///
/// `timeout_ms: Some(None)` clears the timeout; `None` leaves it alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ConfigUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_strategy: Option<RetryStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retry_delay_ms: Option<u64>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout_ms: Option<Option<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_start: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persist_state: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_file_path: Option<PathBuf>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<u64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<u64>::deserialize(deserializer).map(Some)
}

impl ConfigUpdate {
    pub const fn max_concurrent(mut self, value: usize) -> Self {
        self.max_concurrent = Some(value);
        self
    }

    pub const fn retry_strategy(mut self, value: RetryStrategy) -> Self {
        self.retry_strategy = Some(value);
        self
    }

    pub const fn max_retries(mut self, value: u32) -> Self {
        self.max_retries = Some(value);
        self
    }

    pub const fn retry_delay_ms(mut self, value: u64) -> Self {
        self.retry_delay_ms = Some(value);
        self
    }

    pub const fn timeout_ms(mut self, value: Option<u64>) -> Self {
        self.timeout_ms = Some(value);
        self
    }

    pub const fn priority_enabled(mut self, value: bool) -> Self {
        self.priority_enabled = Some(value);
        self
    }

    pub const fn persist_state(mut self, value: bool) -> Self {
        self.persist_state = Some(value);
        self
    }

    pub fn state_file_path(mut self, value: impl Into<PathBuf>) -> Self {
        self.state_file_path = Some(value.into());
        self
    }
}

/// Named default bundles over [`ProcessorConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessorPreset {
    Basic,
    HighPerformance,
    Server,
    Development,
}

impl ProcessorPreset {
    pub const ALL: [Self; 4] = [
        Self::Basic,
        Self::HighPerformance,
        Self::Server,
        Self::Development,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::HighPerformance => "high-performance",
            Self::Server => "server",
            Self::Development => "development",
        }
    }

    pub fn config(self) -> ProcessorConfig {
        let base = ProcessorConfig::default();
        match self {
            Self::Basic => ProcessorConfig {
                max_concurrent: 2,
                priority_enabled: false,
                auto_start: true,
                ..base
            },
            Self::HighPerformance => ProcessorConfig {
                max_concurrent: 8,
                retry_delay_ms: 500,
                max_retry_delay_ms: 30_000,
                timeout_ms: Some(600_000),
                priority_enabled: true,
                auto_start: true,
                ..base
            },
            Self::Server => ProcessorConfig {
                max_concurrent: 4,
                max_retries: 5,
                retry_delay_ms: 2_000,
                max_retry_delay_ms: 120_000,
                timeout_ms: Some(1_800_000),
                priority_enabled: true,
                auto_start: true,
                persist_state: true,
                ..base
            },
            Self::Development => ProcessorConfig {
                max_concurrent: 1,
                retry_strategy: RetryStrategy::Linear,
                max_retries: 1,
                retry_delay_ms: 100,
                max_retry_delay_ms: 1_000,
                priority_enabled: true,
                auto_start: false,
                ..base
            },
        }
    }
}

impl fmt::Display for ProcessorPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessorPreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "basic" => Ok(Self::Basic),
            "high-performance" => Ok(Self::HighPerformance),
            "server" => Ok(Self::Server),
            "development" | "dev" => Ok(Self::Development),
            _ => Err(ConfigError::UnknownPreset(s.to_string())),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}
