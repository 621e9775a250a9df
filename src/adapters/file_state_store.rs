//! JSON file snapshot store.

use async_trait::async_trait;
use std::path::Path;
use tokio::fs;
use tracing::{debug, instrument};

use crate::domain::errors::{ProcessorError, ProcessorResult};
use crate::domain::models::StateSnapshot;
use crate::domain::ports::StateStore;

/// Stores snapshots as pretty-printed JSON files.
///
/// Writes go to a sibling `.tmp` file that is renamed over the target, so a
/// crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStateStore;

impl FileStateStore {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    #[instrument(skip(self, path, snapshot), fields(path = %path.display(), tasks = snapshot.tasks.len()), err)]
    async fn save(&self, path: &Path, snapshot: &StateSnapshot) -> ProcessorResult<()> {
        let json = snapshot.to_json()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ProcessorError::persistence(parent, e))?;
        }

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        fs::write(&tmp, json)
            .await
            .map_err(|e| ProcessorError::persistence(path, e))?;
        fs::rename(&tmp, path)
            .await
            .map_err(|e| ProcessorError::persistence(path, e))?;

        debug!("snapshot written");
        Ok(())
    }

    #[instrument(skip(self, path), fields(path = %path.display()), err)]
    async fn load(&self, path: &Path) -> ProcessorResult<StateSnapshot> {
        let raw = fs::read_to_string(path)
            .await
            .map_err(|e| ProcessorError::persistence(path, e))?;

        StateSnapshot::from_json(&raw).map_err(|e| ProcessorError::persistence(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Statistics, Task, TaskId};
    use chrono::Utc;

    fn snapshot() -> StateSnapshot {
        let task = Task::new(TaskId(1), "tts", "script.txt", "voice.wav", 3);
        StateSnapshot {
            statistics: Statistics::from_tasks([&task]),
            queue: vec![task.id],
            tasks: vec![(task.id, task)],
            next_task_id: 2,
            saved_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_save_creates_parent_dirs_and_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/state.json");
        let store = FileStateStore::new();

        let original = snapshot();
        store.save(&path, &original).await.unwrap();
        assert!(path.exists());

        let loaded = store.load(&path).await.unwrap();
        assert_eq!(loaded, original);
    }

    #[tokio::test]
    async fn test_load_missing_file_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileStateStore::new()
            .load(&dir.path().join("missing.json"))
            .await;
        assert!(matches!(result, Err(ProcessorError::Persistence { .. })));
    }

    #[tokio::test]
    async fn test_load_garbage_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let result = FileStateStore::new().load(&path).await;
        assert!(matches!(result, Err(ProcessorError::Persistence { .. })));
    }
}
