//! Batch processor engine.
//!
//! Every long-running media operation funnels through one [`BatchProcessor`]:
//!
//! ```text
//! add_task ──▶ TaskStore ──▶ DispatchQueue ──(slot free)──▶ handler
//!                  ▲                                          │
//!                  └──── retry backoff ◀── RetryController ◀──┘
//! ```
//!
//! All scheduler state sits behind one mutex. Handlers and event listeners
//! always run with that lock released. Events are queued in an outbox while
//! the lock is held, so they are published in the order the state changed.

use futures::FutureExt;
use std::collections::{HashMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::adapters::FileStateStore;
use crate::domain::errors::{ProcessorError, ProcessorResult};
use crate::domain::models::{
    ConfigUpdate, NewTask, ProcessingResult, ProcessorConfig, ProcessorPreset, Statistics, Task,
    TaskId, TaskOptions, TaskStatus,
};
use crate::domain::ports::{StateStore, TaskHandler};
use crate::services::event_bus::{
    EventBus, EventBusConfig, EventEnvelope, EventKind, ListenerId, ProcessorEvent,
};
use crate::services::handler_registry::HandlerRegistry;
use crate::services::retry_controller::{RetryController, RetryDecision};
use crate::services::task_store::TaskStore;

/// Mutable scheduler state guarded by the processor mutex.
struct ProcessorState {
    config: ProcessorConfig,
    retry: RetryController,
    store: TaskStore,
    running: bool,
    /// Dispatch token → task, one entry per live handler invocation.
    /// Its length is the number of occupied worker slots.
    in_flight: HashMap<u64, TaskId>,
    /// Token of the attempt whose outcome may still update each task.
    current_dispatch: HashMap<TaskId, u64>,
    retry_timers: HashMap<TaskId, JoinHandle<()>>,
    next_token: u64,
    /// Events waiting to be published, in mutation order.
    outbox: VecDeque<ProcessorEvent>,
    /// Set while some caller is publishing the outbox.
    draining: bool,
}

impl ProcessorState {
    fn new(config: ProcessorConfig) -> Self {
        Self {
            retry: RetryController::from_config(&config),
            config,
            store: TaskStore::new(),
            running: false,
            in_flight: HashMap::new(),
            current_dispatch: HashMap::new(),
            retry_timers: HashMap::new(),
            next_token: 0,
            outbox: VecDeque::new(),
            draining: false,
        }
    }

    /// Stop tracking a task's pending retry and live attempt.
    fn detach(&mut self, id: TaskId) {
        if let Some(timer) = self.retry_timers.remove(&id) {
            timer.abort();
        }
        self.current_dispatch.remove(&id);
    }

    fn detach_all(&mut self) {
        for (_, timer) in self.retry_timers.drain() {
            timer.abort();
        }
        self.current_dispatch.clear();
    }

    fn emit(&mut self, event: ProcessorEvent) {
        self.outbox.push_back(event);
    }

    fn emit_statistics(&mut self) {
        let statistics = self.store.statistics();
        self.emit(ProcessorEvent::StatisticsUpdated { statistics });
    }
}

/// One handler invocation about to be spawned.
struct Launch {
    token: u64,
    task: Task,
    timeout: Option<Duration>,
}

struct Inner {
    state: Mutex<ProcessorState>,
    handlers: RwLock<HandlerRegistry>,
    events: EventBus,
    state_store: Arc<dyn StateStore>,
    /// Signalled every time an in-flight invocation settles
    settled: Notify,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, ProcessorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a single event and publish the outbox.
    fn emit(&self, event: ProcessorEvent) {
        self.lock().emit(event);
        self.flush();
    }

    /// Publish queued events with the lock released.
    ///
    /// Only one caller drains at a time. Events queued meanwhile, including
    /// those from listeners calling back into the processor, are picked up
    /// by the active drainer before it lets go.
    fn flush(&self) {
        {
            let mut state = self.lock();
            if state.draining {
                return;
            }
            state.draining = true;
        }

        loop {
            let batch: Vec<ProcessorEvent> = {
                let mut state = self.lock();
                if state.outbox.is_empty() {
                    state.draining = false;
                    return;
                }
                state.outbox.drain(..).collect()
            };
            for event in batch {
                self.events.publish(event);
            }
        }
    }

    fn handler_for(&self, operation: &str) -> Option<Arc<dyn TaskHandler>> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(operation)
    }

    /// Dispatch loop: fill free slots from the queue while running.
    fn pump(self: &Arc<Self>) {
        let runtime = Handle::try_current().ok();
        let mut launches = Vec::new();

        {
            let mut guard = self.lock();
            let state = &mut *guard;

            while state.running && state.in_flight.len() < state.config.max_concurrent {
                if runtime.is_none() {
                    warn!("no tokio runtime available, dispatch deferred");
                    break;
                }

                let Some(id) = state.store.dequeue(state.config.priority_enabled) else {
                    break;
                };
                let Some(task) = state.store.get_mut(id) else {
                    continue;
                };

                task.mark_processing();
                let task = task.clone();

                let token = state.next_token;
                state.next_token += 1;
                state.in_flight.insert(token, id);
                state.current_dispatch.insert(id, token);

                debug!(
                    task_id = %id,
                    operation = %task.operation,
                    attempt = task.retry_count + 1,
                    in_flight = state.in_flight.len(),
                    "dispatching task"
                );

                state.emit(ProcessorEvent::TaskStarted { task: task.clone() });
                launches.push(Launch {
                    token,
                    task,
                    timeout: state.config.timeout(),
                });
            }

            if !launches.is_empty() {
                state.emit_statistics();
            }
        }

        self.flush();

        let Some(runtime) = runtime else {
            return;
        };
        for launch in launches {
            let handler = self.handler_for(&launch.task.operation);
            let inner = Arc::clone(self);
            runtime.spawn(async move {
                inner.run_attempt(launch, handler).await;
            });
        }
    }

    async fn run_attempt(self: Arc<Self>, launch: Launch, handler: Option<Arc<dyn TaskHandler>>) {
        let Launch {
            token,
            task,
            timeout,
        } = launch;
        let task_id = task.id;

        let started = Instant::now();
        let outcome = invoke_handler(handler, task, timeout).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        self.settle(token, task_id, outcome, elapsed_ms);
        self.settled.notify_waiters();
        self.pump();
    }

    /// Free the slot and route the outcome through the retry state machine.
    fn settle(
        self: &Arc<Self>,
        token: u64,
        task_id: TaskId,
        outcome: ProcessorResult<ProcessingResult>,
        elapsed_ms: u64,
    ) {
        {
            let mut guard = self.lock();
            let state = &mut *guard;

            state.in_flight.remove(&token);
            let live = state.current_dispatch.get(&task_id) == Some(&token);
            if live {
                state.current_dispatch.remove(&task_id);
            }

            let Some(task) = state
                .store
                .get_mut(task_id)
                .filter(|task| live && task.status == TaskStatus::Processing)
            else {
                debug!(task_id = %task_id, "discarding outcome of cancelled or removed task");
                return;
            };

            match outcome {
                Ok(mut result) => {
                    result.task_id = task_id;
                    result.retry_count = task.retry_count;
                    if result.processing_time == 0 {
                        result.processing_time = elapsed_ms;
                    }
                    task.mark_completed(result);
                    info!(
                        task_id = %task_id,
                        operation = %task.operation,
                        elapsed_ms,
                        "task completed"
                    );
                    let event = ProcessorEvent::TaskCompleted { task: task.clone() };
                    state.emit(event);
                }
                Err(error) => {
                    let message = error.to_string();
                    match state.retry.decide(task.retry_count, task.max_retries) {
                        RetryDecision::Retry { attempt, delay } => {
                            task.retry_count = attempt;
                            task.status = TaskStatus::Queued;
                            task.error = Some(message.clone());
                            let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                            warn!(
                                task_id = %task_id,
                                attempt,
                                max_retries = task.max_retries,
                                delay_ms,
                                error = %message,
                                "task attempt failed, retrying"
                            );
                            let event = ProcessorEvent::TaskRetrying {
                                task_id,
                                attempt,
                                max_retries: task.max_retries,
                                delay_ms,
                                error: message,
                            };
                            state.emit(event);

                            let inner = Arc::clone(self);
                            let timer = tokio::spawn(async move {
                                tokio::time::sleep(delay).await;
                                inner.requeue(task_id);
                            });
                            state.retry_timers.insert(task_id, timer);
                        }
                        RetryDecision::Fail => {
                            task.mark_failed(message.clone());
                            warn!(
                                task_id = %task_id,
                                retries = task.retry_count,
                                error = %message,
                                "task failed"
                            );
                            let event = ProcessorEvent::TaskFailed {
                                task: task.clone(),
                                error: message,
                            };
                            state.emit(event);
                        }
                    }
                }
            }

            state.emit_statistics();
        }

        self.flush();
    }

    /// Backoff elapsed: put the task back in line.
    fn requeue(self: &Arc<Self>, task_id: TaskId) {
        let requeued = {
            let mut state = self.lock();
            state.retry_timers.remove(&task_id);
            state.store.enqueue(task_id)
        };

        if requeued {
            debug!(task_id = %task_id, "task requeued after backoff");
            self.pump();
        }
    }
}

/// Run one handler attempt, folding every failure mode into an error.
async fn invoke_handler(
    handler: Option<Arc<dyn TaskHandler>>,
    task: Task,
    timeout: Option<Duration>,
) -> ProcessorResult<ProcessingResult> {
    let Some(handler) = handler else {
        return Err(ProcessorError::HandlerMissing(task.operation));
    };

    let attempt = AssertUnwindSafe(handler.handle(task)).catch_unwind();
    let settled = match timeout {
        Some(limit) => tokio::time::timeout(limit, attempt)
            .await
            .map_err(|_| ProcessorError::Timeout {
                timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            })?,
        None => attempt.await,
    };

    match settled {
        Err(panic) => Err(ProcessorError::HandlerPanicked(panic_message(&*panic))),
        Ok(Err(err)) => Err(ProcessorError::HandlerExecution(format!("{err:#}"))),
        Ok(Ok(result)) if !result.success => Err(ProcessorError::HandlerExecution(
            result
                .error
                .unwrap_or_else(|| "handler reported failure".to_string()),
        )),
        Ok(Ok(result)) => Ok(result),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Builder for [`BatchProcessor`].
pub struct BatchProcessorBuilder {
    config: ProcessorConfig,
    state_store: Arc<dyn StateStore>,
    event_config: EventBusConfig,
}

impl BatchProcessorBuilder {
    pub fn config(mut self, config: ProcessorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn preset(mut self, preset: ProcessorPreset) -> Self {
        self.config = preset.config();
        self
    }

    pub fn state_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.state_store = store;
        self
    }

    pub fn event_bus_config(mut self, config: EventBusConfig) -> Self {
        self.event_config = config;
        self
    }

    /// Validate the configuration and build the processor.
    ///
    /// With `auto_start` the processor starts immediately.
    pub fn build(self) -> ProcessorResult<BatchProcessor> {
        self.config.validate()?;
        let auto_start = self.config.auto_start;

        let processor = BatchProcessor {
            inner: Arc::new(Inner {
                state: Mutex::new(ProcessorState::new(self.config)),
                handlers: RwLock::new(HandlerRegistry::new()),
                events: EventBus::new(self.event_config),
                state_store: self.state_store,
                settled: Notify::new(),
            }),
        };

        if auto_start {
            processor.start();
        }
        Ok(processor)
    }
}

impl Default for BatchProcessorBuilder {
    fn default() -> Self {
        Self {
            config: ProcessorConfig::default(),
            state_store: Arc::new(FileStateStore::new()),
            event_config: EventBusConfig::default(),
        }
    }
}

/// In-process batch task scheduling engine.
///
/// Cloning is cheap and every clone drives the same engine, so handlers may
/// keep a clone to report progress.
///
/// # Examples
///
/// ```no_run
/// use batchq::domain::models::{ProcessingResult, ProcessorConfig, TaskOptions};
/// use batchq::domain::ports::handler_fn;
/// use batchq::services::BatchProcessor;
///
/// # async fn example() -> anyhow::Result<()> {
/// let processor = BatchProcessor::new(ProcessorConfig::default())?;
/// processor.register_handler(
///     "transcode",
///     handler_fn(|task| async move { Ok(ProcessingResult::success(task.id)) }),
/// );
///
/// processor.add_task("transcode", "in.mov", "out.mp4", TaskOptions::default());
/// processor.start();
/// processor.stop().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BatchProcessor {
    inner: Arc<Inner>,
}

impl BatchProcessor {
    /// Create a processor with a validated configuration.
    pub fn new(config: ProcessorConfig) -> ProcessorResult<Self> {
        Self::builder().config(config).build()
    }

    /// Create a processor from a named preset.
    pub fn with_preset(preset: ProcessorPreset) -> ProcessorResult<Self> {
        Self::builder().preset(preset).build()
    }

    pub fn builder() -> BatchProcessorBuilder {
        BatchProcessorBuilder::default()
    }

    // ---------------------------------------------------------------------
    // Task store
    // ---------------------------------------------------------------------

    /// Admit a task; it is queued and dispatched once a slot frees up.
    pub fn add_task(
        &self,
        operation: impl Into<String>,
        input_path: impl Into<String>,
        output_path: impl Into<String>,
        options: TaskOptions,
    ) -> TaskId {
        let request = NewTask {
            operation: operation.into(),
            input_path: input_path.into(),
            output_path: output_path.into(),
            options,
        };
        self.add_tasks(vec![request])
            .into_iter()
            .next()
            .unwrap_or(TaskId(0))
    }

    /// Admit a batch, preserving caller order.
    pub fn add_tasks(&self, batch: Vec<NewTask>) -> Vec<TaskId> {
        if batch.is_empty() {
            return Vec::new();
        }

        let mut ids = Vec::with_capacity(batch.len());
        {
            let mut guard = self.inner.lock();
            let state = &mut *guard;
            for request in batch {
                let id = state.store.allocate_id();
                let task = Task::from_request(id, request, state.config.max_retries);
                debug!(
                    task_id = %id,
                    operation = %task.operation,
                    priority = %task.priority,
                    "task added"
                );
                state.emit(ProcessorEvent::TaskAdded {
                    task_id: id,
                    operation: task.operation.clone(),
                });
                state.store.insert(task);
                ids.push(id);
            }
            state.emit_statistics();
        }

        self.inner.flush();
        self.inner.pump();
        ids
    }

    pub fn get_task(&self, id: TaskId) -> Option<Task> {
        self.inner.lock().store.get(id).cloned()
    }

    /// All tasks in insertion order.
    pub fn get_all_tasks(&self) -> Vec<Task> {
        self.inner.lock().store.iter().cloned().collect()
    }

    pub fn get_tasks_by_status(&self, status: TaskStatus) -> Vec<Task> {
        self.inner.lock().store.by_status(status)
    }

    /// Queued ids in the order the dispatcher would pick them.
    ///
    /// Tasks waiting out a retry backoff are not listed.
    pub fn queued_ids(&self) -> Vec<TaskId> {
        let state = self.inner.lock();
        state.store.queued_ids(state.config.priority_enabled)
    }

    /// Cancel a queued or processing task.
    ///
    /// A processing task's handler keeps running; its outcome is discarded.
    #[instrument(skip(self), fields(task_id = %id))]
    pub fn cancel_task(&self, id: TaskId) -> bool {
        {
            let mut guard = self.inner.lock();
            let state = &mut *guard;

            let cancellable = state
                .store
                .get(id)
                .is_some_and(|task| task.status.can_transition_to(TaskStatus::Cancelled));
            if !cancellable {
                return false;
            }

            state.store.unqueue(id);
            state.detach(id);
            let Some(task) = state.store.get_mut(id) else {
                return false;
            };
            task.mark_cancelled();
            info!("task cancelled");

            let event = ProcessorEvent::TaskCancelled { task: task.clone() };
            state.emit(event);
            state.emit_statistics();
        }

        self.inner.flush();
        true
    }

    /// Delete a task record from any state.
    ///
    /// If the task is processing, its worker slot stays occupied until the
    /// handler settles and the outcome is discarded.
    #[instrument(skip(self), fields(task_id = %id))]
    pub fn remove_task(&self, id: TaskId) -> bool {
        {
            let mut guard = self.inner.lock();
            let state = &mut *guard;

            if state.store.remove(id).is_none() {
                return false;
            }
            state.detach(id);
            debug!("task removed");

            state.emit(ProcessorEvent::TaskRemoved { task_id: id });
            state.emit_statistics();
        }

        self.inner.flush();
        true
    }

    /// Remove every completed or failed task. Cancelled tasks stay.
    pub fn clear_completed_tasks(&self) -> usize {
        let removed = {
            let mut state = self.inner.lock();
            let removed = state.store.clear_finished().len();
            state.emit_statistics();
            removed
        };

        info!(removed, "cleared finished tasks");
        self.inner.flush();
        removed
    }

    /// Report progress for a processing task, clamped to 0..=100.
    pub fn update_progress(&self, id: TaskId, progress: u8) -> bool {
        {
            let mut state = self.inner.lock();
            let progress = match state.store.get_mut(id) {
                Some(task) if task.status == TaskStatus::Processing => {
                    task.set_progress(progress);
                    task.progress
                }
                _ => return false,
            };
            state.emit(ProcessorEvent::TaskProgress {
                task_id: id,
                progress,
            });
        }

        self.inner.flush();
        true
    }

    // ---------------------------------------------------------------------
    // Handler registry
    // ---------------------------------------------------------------------

    /// Register the handler for `operation`, replacing any existing one.
    pub fn register_handler<H>(&self, operation: impl Into<String>, handler: H)
    where
        H: TaskHandler + 'static,
    {
        self.register_shared_handler(operation, Arc::new(handler));
    }

    pub fn register_shared_handler(
        &self,
        operation: impl Into<String>,
        handler: Arc<dyn TaskHandler>,
    ) {
        let operation = operation.into();
        let replaced = self
            .inner
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(operation.clone(), handler)
            .is_some();

        info!(operation = %operation, replaced, "handler registered");
        self.inner
            .emit(ProcessorEvent::HandlerRegistered { operation });
    }

    pub fn unregister_handler(&self, operation: &str) -> bool {
        let removed = self
            .inner
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .unregister(operation)
            .is_some();

        if removed {
            info!(operation = %operation, "handler unregistered");
            self.inner.emit(ProcessorEvent::HandlerUnregistered {
                operation: operation.to_string(),
            });
        }
        removed
    }

    pub fn has_handler(&self, operation: &str) -> bool {
        self.inner
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(operation)
    }

    pub fn registered_operations(&self) -> Vec<String> {
        self.inner
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .operations()
    }

    // ---------------------------------------------------------------------
    // Dispatcher
    // ---------------------------------------------------------------------

    /// Begin dispatching. Idempotent.
    pub fn start(&self) {
        let started = {
            let mut state = self.inner.lock();
            let started = !std::mem::replace(&mut state.running, true);
            if started {
                state.emit(ProcessorEvent::ProcessorStarted);
            }
            started
        };

        if started {
            info!("processor started");
        }
        self.inner.pump();
    }

    /// Stop dispatching new tasks; in-flight tasks run to completion. Idempotent.
    pub fn pause(&self) {
        let paused = {
            let mut state = self.inner.lock();
            let paused = std::mem::replace(&mut state.running, false);
            if paused {
                state.emit(ProcessorEvent::ProcessorPaused);
            }
            paused
        };

        if paused {
            info!("processor paused");
            self.inner.flush();
        }
    }

    /// Pause, then wait for every in-flight invocation to settle.
    ///
    /// With `persist_state` a final snapshot is written afterwards; a failed
    /// write is logged, not returned.
    pub async fn stop(&self) {
        self.pause();

        loop {
            let settled = self.inner.settled.notified();
            if self.inner.lock().in_flight.is_empty() {
                break;
            }
            settled.await;
        }

        info!("processor stopped");
        self.inner.emit(ProcessorEvent::ProcessorStopped);

        let persist = self.inner.lock().config.persist_state;
        if persist {
            if let Err(err) = self.save_state().await {
                warn!(error = %err, "final snapshot failed");
            }
        }
    }

    /// Clear all tasks and stop dispatching.
    ///
    /// Handlers still in flight finish in the background and their outcomes
    /// are discarded. The id counter is not rewound.
    pub fn reset(&self) {
        {
            let mut guard = self.inner.lock();
            let state = &mut *guard;
            if std::mem::replace(&mut state.running, false) {
                state.emit(ProcessorEvent::ProcessorStopped);
            }
            state.detach_all();
            state.store.clear();
            state.emit_statistics();
        }

        info!("processor reset");
        self.inner.flush();
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().running
    }

    /// Number of handler invocations currently occupying worker slots.
    pub fn in_flight_count(&self) -> usize {
        self.inner.lock().in_flight.len()
    }

    // ---------------------------------------------------------------------
    // Statistics & events
    // ---------------------------------------------------------------------

    pub fn get_statistics(&self) -> Statistics {
        self.inner.lock().store.statistics()
    }

    /// Mean progress over all stored tasks, 0 when there are none.
    pub fn get_overall_progress(&self) -> f64 {
        self.inner.lock().store.overall_progress()
    }

    /// Register a synchronous listener for one event name.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&EventEnvelope) + Send + Sync + 'static,
    {
        self.inner.events.on(kind, listener)
    }

    /// Register a synchronous listener for every event.
    pub fn on_any<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&EventEnvelope) + Send + Sync + 'static,
    {
        self.inner.events.on_any(listener)
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.inner.events.off(id)
    }

    /// Stream of every event envelope.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.inner.events.subscribe()
    }

    // ---------------------------------------------------------------------
    // Configuration
    // ---------------------------------------------------------------------

    pub fn get_config(&self) -> ProcessorConfig {
        self.inner.lock().config.clone()
    }

    /// Shallow-merge `update` into the current configuration.
    ///
    /// Invalid results are rejected without side effects. Retry budgets of
    /// tasks already admitted are not touched.
    #[instrument(skip(self, update), err)]
    pub fn update_config(&self, update: &ConfigUpdate) -> ProcessorResult<ProcessorConfig> {
        let config = {
            let mut state = self.inner.lock();
            let merged = state.config.merged(update);
            merged.validate()?;
            state.retry = RetryController::from_config(&merged);
            state.config = merged.clone();
            state.emit(ProcessorEvent::ConfigUpdated {
                config: merged.clone(),
            });
            merged
        };

        info!(
            max_concurrent = config.max_concurrent,
            priority_enabled = config.priority_enabled,
            "configuration updated"
        );
        self.inner.flush();
        self.inner.pump();
        Ok(config)
    }

    // ---------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------

    /// Snapshot to the configured `state_file_path`.
    pub async fn save_state(&self) -> ProcessorResult<PathBuf> {
        let path = self.inner.lock().config.state_file_path.clone();
        self.save_state_to(&path).await?;
        Ok(path)
    }

    #[instrument(skip(self, path), fields(path = %path.display()), err)]
    pub async fn save_state_to(&self, path: &Path) -> ProcessorResult<()> {
        let snapshot = self.inner.lock().store.snapshot();
        self.inner.state_store.save(path, &snapshot).await?;

        info!(tasks = snapshot.tasks.len(), "state saved");
        self.inner.emit(ProcessorEvent::StateSaved {
            path: path.to_path_buf(),
        });
        Ok(())
    }

    /// Restore from the configured `state_file_path`, replacing all tasks.
    pub async fn load_state(&self) -> ProcessorResult<PathBuf> {
        let path = self.inner.lock().config.state_file_path.clone();
        self.load_state_from(&path).await?;
        Ok(path)
    }

    #[instrument(skip(self, path), fields(path = %path.display()), err)]
    pub async fn load_state_from(&self, path: &Path) -> ProcessorResult<()> {
        let snapshot = self.inner.state_store.load(path).await?;

        {
            let mut guard = self.inner.lock();
            let state = &mut *guard;
            state.detach_all();
            state.store = TaskStore::restore(snapshot);
            info!(
                tasks = state.store.len(),
                next_task_id = state.store.next_id(),
                "state loaded"
            );
            let task_count = state.store.len();
            state.emit(ProcessorEvent::StateLoaded {
                path: path.to_path_buf(),
                task_count,
            });
            state.emit_statistics();
        }

        self.inner.flush();
        self.inner.pump();
        Ok(())
    }
}
