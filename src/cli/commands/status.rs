//! Implementation of the `batchq status` command.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

use crate::adapters::FileStateStore;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{Statistics, Task, TaskStatus};
use crate::domain::ports::StateStore;
use crate::infrastructure::config::ConfigLoader;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOutput {
    pub state_file: PathBuf,
    pub next_task_id: u64,
    pub tasks: Vec<Task>,
    pub statistics: Statistics,
}

impl CommandOutput for StatusOutput {
    fn to_human(&self) -> String {
        let formatter = TableFormatter::new();
        let mut lines = vec![format!("State file: {}", self.state_file.display())];

        if self.tasks.is_empty() {
            lines.push("No tasks found.".to_string());
        } else {
            lines.push(formatter.format_tasks(&self.tasks));
        }
        lines.push(formatter.format_statistics(&self.statistics));
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(
    state: Option<PathBuf>,
    status: Option<TaskStatus>,
    json_mode: bool,
) -> Result<()> {
    let state_file = match state {
        Some(path) => path,
        None => ConfigLoader::load()?.processor.state_file_path,
    };

    let snapshot = FileStateStore::new()
        .load(&state_file)
        .await
        .with_context(|| format!("Failed to read state from {}", state_file.display()))?;

    // Statistics always describe the whole snapshot, not the filtered view
    let statistics = Statistics::from_tasks(snapshot.tasks.iter().map(|(_, task)| task));
    let tasks = snapshot
        .tasks
        .into_iter()
        .map(|(_, task)| task)
        .filter(|task| status.is_none_or(|wanted| task.status == wanted))
        .collect();

    let output_data = StatusOutput {
        state_file,
        next_task_id: snapshot.next_task_id,
        tasks,
        statistics,
    };
    output(&output_data, json_mode);
    Ok(())
}
