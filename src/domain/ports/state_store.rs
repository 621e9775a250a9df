//! State store port - where snapshots live.

use async_trait::async_trait;
use std::path::Path;

use crate::domain::errors::ProcessorResult;
use crate::domain::models::StateSnapshot;

/// Persistence medium for processor snapshots.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Write a snapshot to `path`, replacing any previous one.
    async fn save(&self, path: &Path, snapshot: &StateSnapshot) -> ProcessorResult<()>;

    /// Read the snapshot stored at `path`.
    async fn load(&self, path: &Path) -> ProcessorResult<StateSnapshot>;
}
