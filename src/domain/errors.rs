//! Domain errors for the batch processor.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the processing engine.
///
/// Handler-side variants (`HandlerMissing`, `HandlerExecution`, `Timeout`,
/// `HandlerPanicked`) never escape the engine: they are recorded on the task
/// and drive the retry state machine. Only persistence and configuration
/// errors reach callers.
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("No handler registered for operation '{0}'")]
    HandlerMissing(String),

    #[error("Handler execution failed: {0}")]
    HandlerExecution(String),

    #[error("Task timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Handler panicked: {0}")]
    HandlerPanicked(String),

    #[error("Persistence error at {path}: {message}")]
    Persistence { path: PathBuf, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl ProcessorError {
    pub fn persistence(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::Persistence {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Whether this error came from a handler attempt rather than the engine.
    pub const fn is_handler_failure(&self) -> bool {
        matches!(
            self,
            Self::HandlerMissing(_)
                | Self::HandlerExecution(_)
                | Self::Timeout { .. }
                | Self::HandlerPanicked(_)
        )
    }
}

pub type ProcessorResult<T> = Result<T, ProcessorError>;

impl From<serde_json::Error> for ProcessorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid max_concurrent: {0}. Must be between 1 and 1024")]
    InvalidMaxConcurrent(usize),

    #[error(
        "Invalid retry delay: retry_delay_ms ({0}) must not exceed max_retry_delay_ms ({1})"
    )]
    InvalidRetryDelay(u64, u64),

    #[error("Invalid timeout_ms: 0. Omit the timeout to disable it")]
    ZeroTimeout,

    #[error("state_file_path cannot be empty when persist_state is enabled")]
    EmptyStateFilePath,

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Unknown preset: {0}. Must be one of: basic, high-performance, server, development")]
    UnknownPreset(String),
}
