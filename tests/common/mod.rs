//! Common test utilities for integration tests
//!
//! Provides shared fixtures, handlers, and polling helpers used across
//! multiple integration test files.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::Semaphore;

use batchq::{
    BatchProcessor, EventEnvelope, EventKind, ProcessingResult, ProcessorConfig, Task, TaskHandler,
    TaskId,
};

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Defaults with millisecond backoff so retry tests stay fast
pub fn fast_config() -> ProcessorConfig {
    ProcessorConfig {
        retry_delay_ms: 5,
        max_retry_delay_ms: 20,
        ..ProcessorConfig::default()
    }
}

pub fn processor_with(config: ProcessorConfig) -> BatchProcessor {
    setup_test_logging();
    BatchProcessor::new(config).expect("valid config")
}

/// Wait for a condition to be true with timeout
///
/// Polls the predicate every 10ms until it returns true or timeout is reached.
pub async fn wait_for<F>(mut predicate: F, timeout_ms: u64) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = Duration::from_millis(timeout_ms);

    while start.elapsed() < timeout {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    predicate()
}

/// Wait until every listed task reached a terminal status
pub async fn wait_terminal(processor: &BatchProcessor, ids: &[TaskId]) -> bool {
    wait_for(
        || {
            ids.iter().all(|id| {
                processor
                    .get_task(*id)
                    .is_some_and(|task| task.is_terminal())
            })
        },
        5_000,
    )
    .await
}

/// Collects the names of every published event
pub fn record_events(processor: &BatchProcessor) -> Arc<Mutex<Vec<EventKind>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    processor.on_any(move |envelope: &EventEnvelope| {
        sink.lock().unwrap().push(envelope.kind());
    });
    seen
}

pub fn count_kind(events: &Arc<Mutex<Vec<EventKind>>>, kind: EventKind) -> usize {
    events.lock().unwrap().iter().filter(|k| **k == kind).count()
}

/// Handler that records invocation order and tracks peak concurrency
#[derive(Clone, Default)]
pub struct RecordingHandler {
    pub order: Arc<Mutex<Vec<String>>>,
    pub active: Arc<AtomicUsize>,
    pub peak: Arc<AtomicUsize>,
    pub work: Duration,
}

impl RecordingHandler {
    pub fn with_work(work: Duration) -> Self {
        Self {
            work,
            ..Self::default()
        }
    }

    pub fn order(&self) -> Vec<String> {
        self.order.lock().unwrap().clone()
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskHandler for RecordingHandler {
    async fn handle(&self, task: Task) -> anyhow::Result<ProcessingResult> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.order.lock().unwrap().push(task.input_path.clone());

        if !self.work.is_zero() {
            tokio::time::sleep(self.work).await;
        }

        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(ProcessingResult::success(task.id).with_output_path(task.output_path))
    }
}

/// Handler that fails the first `failures` attempts of every task
#[derive(Clone, Default)]
pub struct FlakyHandler {
    pub failures: usize,
    pub attempts: Arc<Mutex<HashMap<TaskId, usize>>>,
}

impl FlakyHandler {
    pub fn failing(failures: usize) -> Self {
        Self {
            failures,
            ..Self::default()
        }
    }

    pub fn attempts(&self, id: TaskId) -> usize {
        self.attempts.lock().unwrap().get(&id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl TaskHandler for FlakyHandler {
    async fn handle(&self, task: Task) -> anyhow::Result<ProcessingResult> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let count = attempts.entry(task.id).or_insert(0);
            *count += 1;
            *count
        };

        if attempt <= self.failures {
            anyhow::bail!("transient failure on attempt {attempt}");
        }
        Ok(ProcessingResult::success(task.id))
    }
}

/// Handler that blocks until the test releases it
#[derive(Clone)]
pub struct GatedHandler {
    pub gate: Arc<Semaphore>,
    pub started: Arc<AtomicUsize>,
}

impl GatedHandler {
    pub fn new() -> Self {
        Self {
            gate: Arc::new(Semaphore::new(0)),
            started: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn release(&self, permits: usize) {
        self.gate.add_permits(permits);
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskHandler for GatedHandler {
    async fn handle(&self, task: Task) -> anyhow::Result<ProcessingResult> {
        self.started.fetch_add(1, Ordering::SeqCst);
        self.gate.acquire().await?.forget();
        Ok(ProcessingResult::success(task.id))
    }
}
