use serde::{Deserialize, Serialize};

use super::task::TaskId;

/// Outcome reported by a task handler.
///
/// `success = false` is treated exactly like a rejected handler future.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult {
    pub task_id: TaskId,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock handler time in milliseconds
    pub processing_time: u64,
    pub retry_count: u32,
}

impl ProcessingResult {
    pub const fn success(task_id: TaskId) -> Self {
        Self {
            task_id,
            success: true,
            output_path: None,
            error: None,
            processing_time: 0,
            retry_count: 0,
        }
    }

    pub fn failure(task_id: TaskId, error: impl Into<String>) -> Self {
        Self {
            task_id,
            success: false,
            output_path: None,
            error: Some(error.into()),
            processing_time: 0,
            retry_count: 0,
        }
    }

    pub fn with_output_path(mut self, output_path: impl Into<String>) -> Self {
        self.output_path = Some(output_path.into());
        self
    }
}
