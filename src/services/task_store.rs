//! Task store: insertion-ordered task records plus the dispatch queue.

use chrono::Utc;
use indexmap::IndexMap;
use std::collections::HashSet;

use crate::domain::models::{DispatchQueue, StateSnapshot, Statistics, Task, TaskId, TaskStatus};

/// Owns task records, the id counter and the dispatch queue.
///
/// Invariant: every id in the queue refers to a stored task with status
/// `Queued`. Queued tasks waiting out a retry backoff are stored but not
/// enqueued.
#[derive(Debug)]
pub struct TaskStore {
    tasks: IndexMap<TaskId, Task>,
    queue: DispatchQueue<TaskId>,
    next_id: u64,
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            tasks: IndexMap::new(),
            queue: DispatchQueue::new(),
            next_id: 1,
        }
    }

    /// Hand out the next sequential id.
    pub fn allocate_id(&mut self) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        id
    }

    pub const fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Store a task at the tail of the insertion order, enqueuing it if queued.
    pub fn insert(&mut self, task: Task) {
        let id = task.id;
        let enqueue = task.status == TaskStatus::Queued;
        let priority = task.priority;
        self.tasks.insert(id, task);
        if enqueue {
            self.queue.enqueue(id, priority);
        }
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(&id)
    }

    /// Tasks in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn by_status(&self, status: TaskStatus) -> Vec<Task> {
        self.iter()
            .filter(|task| task.status == status)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Put a queued task back on the dispatch queue (retry path).
    ///
    /// Returns `false` if the task is gone or no longer queued.
    pub fn enqueue(&mut self, id: TaskId) -> bool {
        match self.tasks.get(&id) {
            Some(task) if task.status == TaskStatus::Queued => {
                self.queue.enqueue(id, task.priority);
                true
            }
            _ => false,
        }
    }

    /// Pop the next dispatchable id under the selected policy.
    pub fn dequeue(&mut self, priority_enabled: bool) -> Option<TaskId> {
        while let Some(id) = self.queue.dequeue(priority_enabled) {
            if self
                .tasks
                .get(&id)
                .is_some_and(|task| task.status == TaskStatus::Queued)
            {
                return Some(id);
            }
        }
        None
    }

    /// Drop an id from the dispatch queue, keeping the record.
    pub fn unqueue(&mut self, id: TaskId) -> bool {
        !self.queue.remove_matching(|queued| *queued == id).is_empty()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Queued ids in the order they would be dispatched.
    pub fn queued_ids(&self, priority_enabled: bool) -> Vec<TaskId> {
        self.queue
            .iter_dispatch_order(priority_enabled)
            .into_iter()
            .copied()
            .collect()
    }

    /// Delete a task record from any state.
    pub fn remove(&mut self, id: TaskId) -> Option<Task> {
        let task = self.tasks.shift_remove(&id)?;
        self.unqueue(id);
        Some(task)
    }

    /// Remove every completed or failed task, returning their ids.
    pub fn clear_finished(&mut self) -> Vec<TaskId> {
        let mut finished = Vec::new();
        self.tasks.retain(|id, task| {
            let done = matches!(task.status, TaskStatus::Completed | TaskStatus::Failed);
            if done {
                finished.push(*id);
            }
            !done
        });
        finished
    }

    /// Drop all tasks and queue entries. The id counter keeps counting.
    pub fn clear(&mut self) {
        self.tasks.clear();
        self.queue.clear();
    }

    pub fn statistics(&self) -> Statistics {
        Statistics::from_tasks(self.iter())
    }

    /// Mean progress across stored tasks, 0 when empty.
    #[allow(clippy::cast_precision_loss)]
    pub fn overall_progress(&self) -> f64 {
        if self.tasks.is_empty() {
            return 0.0;
        }
        let sum: u64 = self.iter().map(|task| u64::from(task.progress)).sum();
        sum as f64 / self.tasks.len() as f64
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            tasks: self.iter().map(|task| (task.id, task.clone())).collect(),
            queue: self.queue.iter_fifo().copied().collect(),
            next_task_id: self.next_id,
            statistics: self.statistics(),
            saved_at: Utc::now(),
        }
    }

    /// Rebuild a store from a snapshot.
    ///
    /// Tasks saved mid-flight come back as queued, and queued tasks the saved
    /// queue does not mention are appended to it so nothing is stranded.
    /// Progress is clamped to 100 and retry counts to the task's budget.
    pub fn restore(snapshot: StateSnapshot) -> Self {
        let mut store = Self::new();

        for (id, mut task) in snapshot.tasks {
            task.id = id;
            task.set_progress(task.progress);
            task.retry_count = task.retry_count.min(task.max_retries);
            if task.status == TaskStatus::Processing {
                task.status = TaskStatus::Queued;
                task.started_at = None;
            }
            store.tasks.insert(id, task);
        }

        let mut enqueued = HashSet::new();
        for id in snapshot.queue {
            store.enqueue_once(id, &mut enqueued);
        }
        let stranded: Vec<TaskId> = store
            .iter()
            .filter(|task| task.status == TaskStatus::Queued)
            .map(|task| task.id)
            .collect();
        for id in stranded {
            store.enqueue_once(id, &mut enqueued);
        }

        let max_id = store.tasks.keys().map(|id| id.sequence()).max().unwrap_or(0);
        store.next_id = snapshot.next_task_id.max(max_id + 1);
        store
    }

    fn enqueue_once(&mut self, id: TaskId, enqueued: &mut HashSet<TaskId>) {
        if !enqueued.contains(&id) && self.enqueue(id) {
            enqueued.insert(id);
        }
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}
