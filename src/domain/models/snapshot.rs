use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::statistics::Statistics;
use super::task::{Task, TaskId};

/// Point-in-time image of the processor state.
///
/// Serializes to `{tasks: [[id, task]], queue: [id], nextTaskId, statistics, savedAt}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    /// Tasks in insertion order
    pub tasks: Vec<(TaskId, Task)>,
    /// Dispatch queue in enqueue order
    pub queue: Vec<TaskId>,
    /// Next sequence the id counter will hand out
    pub next_task_id: u64,
    pub statistics: Statistics,
    pub saved_at: DateTime<Utc>,
}

impl StateSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_wire_shape() {
        let task = Task::new(TaskId(1), "watermark", "a.mp4", "b.mp4", 3);
        let snapshot = StateSnapshot {
            tasks: vec![(task.id, task.clone())],
            queue: vec![task.id],
            next_task_id: 2,
            statistics: Statistics::from_tasks([&task]),
            saved_at: Utc::now(),
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["tasks"][0][0], "task_1");
        assert_eq!(value["tasks"][0][1]["operation"], "watermark");
        assert_eq!(value["queue"][0], "task_1");
        assert_eq!(value["nextTaskId"], 2);
        assert_eq!(value["statistics"]["queued"], 1);
        assert!(value["savedAt"].is_string());

        let back = StateSnapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(back, snapshot);
    }
}
