//! Task domain model.
//!
//! Tasks are the schedulable units of work that flow through the batch
//! processor. The engine never interprets `input_path`/`output_path` or
//! `metadata`; they are handed to the registered handler untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::result::ProcessingResult;

const TASK_ID_PREFIX: &str = "task_";

/// Sequential task identifier.
///
/// Ids are allocated from a per-engine counter and are strictly increasing.
/// The stable string form is `task_<n>`, which is also the serialized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u64);

impl TaskId {
    pub const fn sequence(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{TASK_ID_PREFIX}{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix(TASK_ID_PREFIX).unwrap_or(s);
        digits
            .parse::<u64>()
            .map(TaskId)
            .map_err(|_| format!("invalid task id: {s}"))
    }
}

impl Serialize for TaskId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Status of a task in the processing pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for a worker slot (or for its retry backoff to elapse)
    Queued,
    /// Handler invocation in flight
    Processing,
    /// Handler reported success
    Completed,
    /// Handler failed and the retry budget is exhausted
    Failed,
    /// Cancelled by the caller
    Cancelled,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Queued
    }
}

impl TaskStatus {
    pub const ALL: [Self; 5] = [
        Self::Queued,
        Self::Processing,
        Self::Completed,
        Self::Failed,
        Self::Cancelled,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Check if this is a terminal state.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Valid transitions from this status.
    ///
    /// `Processing -> Queued` is the retry path.
    pub fn valid_transitions(&self) -> Vec<Self> {
        match self {
            Self::Queued => vec![Self::Processing, Self::Cancelled],
            Self::Processing => vec![
                Self::Queued,
                Self::Completed,
                Self::Failed,
                Self::Cancelled,
            ],
            Self::Completed | Self::Failed | Self::Cancelled => vec![],
        }
    }

    pub fn can_transition_to(&self, new_status: Self) -> bool {
        self.valid_transitions().contains(&new_status)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "queued" => Ok(Self::Queued),
            "processing" => Ok(Self::Processing),
            "completed" | "complete" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}

/// Priority tier for dispatch ordering.
///
/// Ordering follows urgency: `Low < Normal < High < Urgent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low = 0,
    Normal = 1,
    High = 2,
    Urgent = 3,
}

impl Default for TaskPriority {
    fn default() -> Self {
        Self::Normal
    }
}

impl TaskPriority {
    /// Tiers from most to least urgent.
    pub const DESCENDING: [Self; 4] = [Self::Urgent, Self::High, Self::Normal, Self::Low];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    /// Index into per-tier storage, 0 being the most urgent tier.
    pub const fn tier_index(self) -> usize {
        match self {
            Self::Urgent => 0,
            Self::High => 1,
            Self::Normal => 2,
            Self::Low => 3,
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            other => Err(format!("unknown task priority: {other}")),
        }
    }
}

/// Optional per-task settings supplied at admission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOptions {
    #[serde(default)]
    pub priority: TaskPriority,
    /// Overrides the configured `max_retries` for this task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl TaskOptions {
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// One entry of an `add_tasks` batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub operation: String,
    pub input_path: String,
    pub output_path: String,
    #[serde(default)]
    pub options: TaskOptions,
}

impl NewTask {
    pub fn new(
        operation: impl Into<String>,
        input_path: impl Into<String>,
        output_path: impl Into<String>,
    ) -> Self {
        Self {
            operation: operation.into(),
            input_path: input_path.into(),
            output_path: output_path.into(),
            options: TaskOptions::default(),
        }
    }

    pub fn with_options(mut self, options: TaskOptions) -> Self {
        self.options = options;
        self
    }
}

/// A schedulable unit of work.
///
/// Field names serialize in camelCase because the snapshot file format is
/// shared with the dashboards that render it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    /// Key into the handler registry
    pub operation: String,
    pub input_path: String,
    pub output_path: String,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    /// Percentage in `0..=100`
    pub progress: u8,
    pub retry_count: u32,
    pub max_retries: u32,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ProcessingResult>,
}

impl Task {
    /// Create a queued task.
    pub fn new(
        id: TaskId,
        operation: impl Into<String>,
        input_path: impl Into<String>,
        output_path: impl Into<String>,
        max_retries: u32,
    ) -> Self {
        Self {
            id,
            operation: operation.into(),
            input_path: input_path.into(),
            output_path: output_path.into(),
            priority: TaskPriority::default(),
            status: TaskStatus::Queued,
            progress: 0,
            retry_count: 0,
            max_retries,
            metadata: HashMap::new(),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error: None,
            result: None,
        }
    }

    /// Build a task from a batch entry, resolving defaults from `default_max_retries`.
    pub fn from_request(id: TaskId, request: NewTask, default_max_retries: u32) -> Self {
        let NewTask {
            operation,
            input_path,
            output_path,
            options,
        } = request;

        let mut task = Self::new(
            id,
            operation,
            input_path,
            output_path,
            options.max_retries.unwrap_or(default_max_retries),
        );
        task.priority = options.priority;
        task.metadata = options.metadata;
        task
    }

    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Set progress, clamped to `0..=100`.
    pub fn set_progress(&mut self, progress: u8) {
        self.progress = progress.min(100);
    }

    pub(crate) fn mark_processing(&mut self) {
        self.status = TaskStatus::Processing;
        self.started_at = Some(Utc::now());
    }

    pub(crate) fn mark_completed(&mut self, result: ProcessingResult) {
        self.status = TaskStatus::Completed;
        self.progress = 100;
        self.completed_at = Some(Utc::now());
        self.error = None;
        self.result = Some(result);
    }

    pub(crate) fn mark_failed(&mut self, error: String) {
        self.status = TaskStatus::Failed;
        self.completed_at = Some(Utc::now());
        self.error = Some(error);
    }

    pub(crate) fn mark_cancelled(&mut self) {
        self.status = TaskStatus::Cancelled;
        self.completed_at = Some(Utc::now());
    }
}
