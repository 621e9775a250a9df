//! EventBus service for processor lifecycle events.
//!
//! Two delivery paths share one sequence counter:
//!
//! - synchronous listeners registered by event name, invoked in registration
//!   order on the publishing thread with panics isolated per listener
//! - a broadcast stream for async consumers (`subscribe`)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;
use tracing::warn;
use uuid::Uuid;

use crate::domain::models::{ProcessorConfig, Statistics, Task, TaskId};

/// Unique identifier for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonically increasing sequence number assigned by EventBus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SequenceNumber(pub u64);

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Event severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Event names listeners subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "handler:registered")]
    HandlerRegistered,
    #[serde(rename = "handler:unregistered")]
    HandlerUnregistered,
    #[serde(rename = "processor:started")]
    ProcessorStarted,
    #[serde(rename = "processor:paused")]
    ProcessorPaused,
    #[serde(rename = "processor:stopped")]
    ProcessorStopped,
    #[serde(rename = "task:added")]
    TaskAdded,
    #[serde(rename = "task:started")]
    TaskStarted,
    #[serde(rename = "task:progress")]
    TaskProgress,
    #[serde(rename = "task:completed")]
    TaskCompleted,
    #[serde(rename = "task:retrying")]
    TaskRetrying,
    #[serde(rename = "task:failed")]
    TaskFailed,
    #[serde(rename = "task:cancelled")]
    TaskCancelled,
    #[serde(rename = "task:removed")]
    TaskRemoved,
    #[serde(rename = "config:updated")]
    ConfigUpdated,
    #[serde(rename = "statistics:updated")]
    StatisticsUpdated,
    #[serde(rename = "state:saved")]
    StateSaved,
    #[serde(rename = "state:loaded")]
    StateLoaded,
}

impl EventKind {
    pub const ALL: [Self; 17] = [
        Self::HandlerRegistered,
        Self::HandlerUnregistered,
        Self::ProcessorStarted,
        Self::ProcessorPaused,
        Self::ProcessorStopped,
        Self::TaskAdded,
        Self::TaskStarted,
        Self::TaskProgress,
        Self::TaskCompleted,
        Self::TaskRetrying,
        Self::TaskFailed,
        Self::TaskCancelled,
        Self::TaskRemoved,
        Self::ConfigUpdated,
        Self::StatisticsUpdated,
        Self::StateSaved,
        Self::StateLoaded,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::HandlerRegistered => "handler:registered",
            Self::HandlerUnregistered => "handler:unregistered",
            Self::ProcessorStarted => "processor:started",
            Self::ProcessorPaused => "processor:paused",
            Self::ProcessorStopped => "processor:stopped",
            Self::TaskAdded => "task:added",
            Self::TaskStarted => "task:started",
            Self::TaskProgress => "task:progress",
            Self::TaskCompleted => "task:completed",
            Self::TaskRetrying => "task:retrying",
            Self::TaskFailed => "task:failed",
            Self::TaskCancelled => "task:cancelled",
            Self::TaskRemoved => "task:removed",
            Self::ConfigUpdated => "config:updated",
            Self::StatisticsUpdated => "statistics:updated",
            Self::StateSaved => "state:saved",
            Self::StateLoaded => "state:loaded",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown event: {s}"))
    }
}

/// Event payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
#[allow(clippy::large_enum_variant)]
pub enum ProcessorEvent {
    HandlerRegistered {
        operation: String,
    },
    HandlerUnregistered {
        operation: String,
    },
    ProcessorStarted,
    ProcessorPaused,
    ProcessorStopped,
    TaskAdded {
        task_id: TaskId,
        operation: String,
    },
    TaskStarted {
        task: Task,
    },
    TaskProgress {
        task_id: TaskId,
        progress: u8,
    },
    TaskCompleted {
        task: Task,
    },
    TaskRetrying {
        task_id: TaskId,
        attempt: u32,
        max_retries: u32,
        delay_ms: u64,
        error: String,
    },
    TaskFailed {
        task: Task,
        error: String,
    },
    TaskCancelled {
        task: Task,
    },
    TaskRemoved {
        task_id: TaskId,
    },
    ConfigUpdated {
        config: ProcessorConfig,
    },
    StatisticsUpdated {
        statistics: Statistics,
    },
    StateSaved {
        path: PathBuf,
    },
    StateLoaded {
        path: PathBuf,
        task_count: usize,
    },
}

impl ProcessorEvent {
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::HandlerRegistered { .. } => EventKind::HandlerRegistered,
            Self::HandlerUnregistered { .. } => EventKind::HandlerUnregistered,
            Self::ProcessorStarted => EventKind::ProcessorStarted,
            Self::ProcessorPaused => EventKind::ProcessorPaused,
            Self::ProcessorStopped => EventKind::ProcessorStopped,
            Self::TaskAdded { .. } => EventKind::TaskAdded,
            Self::TaskStarted { .. } => EventKind::TaskStarted,
            Self::TaskProgress { .. } => EventKind::TaskProgress,
            Self::TaskCompleted { .. } => EventKind::TaskCompleted,
            Self::TaskRetrying { .. } => EventKind::TaskRetrying,
            Self::TaskFailed { .. } => EventKind::TaskFailed,
            Self::TaskCancelled { .. } => EventKind::TaskCancelled,
            Self::TaskRemoved { .. } => EventKind::TaskRemoved,
            Self::ConfigUpdated { .. } => EventKind::ConfigUpdated,
            Self::StatisticsUpdated { .. } => EventKind::StatisticsUpdated,
            Self::StateSaved { .. } => EventKind::StateSaved,
            Self::StateLoaded { .. } => EventKind::StateLoaded,
        }
    }

    pub const fn severity(&self) -> EventSeverity {
        match self {
            Self::TaskFailed { .. } => EventSeverity::Error,
            Self::TaskRetrying { .. } => EventSeverity::Warning,
            Self::TaskProgress { .. } | Self::StatisticsUpdated { .. } => EventSeverity::Debug,
            _ => EventSeverity::Info,
        }
    }

    /// The task this event concerns, if any.
    pub const fn task_id(&self) -> Option<TaskId> {
        match self {
            Self::TaskAdded { task_id, .. }
            | Self::TaskProgress { task_id, .. }
            | Self::TaskRetrying { task_id, .. }
            | Self::TaskRemoved { task_id } => Some(*task_id),
            Self::TaskStarted { task }
            | Self::TaskCompleted { task }
            | Self::TaskFailed { task, .. }
            | Self::TaskCancelled { task } => Some(task.id),
            _ => None,
        }
    }
}

/// Event envelope delivered to listeners and stream subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: EventId,
    pub sequence: SequenceNumber,
    pub timestamp: DateTime<Utc>,
    pub severity: EventSeverity,
    pub event: ProcessorEvent,
}

impl EventEnvelope {
    pub const fn kind(&self) -> EventKind {
        self.event.kind()
    }
}

/// Handle returned by [`EventBus::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Synchronous event listener.
pub type Listener = Arc<dyn Fn(&EventEnvelope) + Send + Sync>;

struct Registration {
    id: ListenerId,
    /// `None` listens to every event
    kind: Option<EventKind>,
    listener: Listener,
}

/// Configuration for the EventBus.
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Capacity of the broadcast channel.
    pub channel_capacity: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

/// Central event bus for the processor.
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
    sequence: AtomicU64,
    next_listener_id: AtomicU64,
    listeners: RwLock<Vec<Registration>>,
}

impl EventBus {
    /// Create a new EventBus with the given configuration.
    pub fn new(config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            sender,
            sequence: AtomicU64::new(0),
            next_listener_id: AtomicU64::new(0),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Register a listener for one event name.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&EventEnvelope) + Send + Sync + 'static,
    {
        self.register(Some(kind), Arc::new(listener))
    }

    /// Register a listener for every event.
    pub fn on_any<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&EventEnvelope) + Send + Sync + 'static,
    {
        self.register(None, Arc::new(listener))
    }

    fn register(&self, kind: Option<EventKind>, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::SeqCst));
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Registration { id, kind, listener });
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|registration| registration.id != id);
        listeners.len() != before
    }

    /// Number of listeners that would receive `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|registration| registration.kind.map_or(true, |k| k == kind))
            .count()
    }

    /// Publish an event to listeners, then to stream subscribers.
    ///
    /// Must not be called while holding processor state locks: listeners may
    /// call back into the processor.
    pub fn publish(&self, event: ProcessorEvent) -> SequenceNumber {
        let sequence = SequenceNumber(self.sequence.fetch_add(1, Ordering::SeqCst));
        let envelope = EventEnvelope {
            id: EventId::new(),
            sequence,
            timestamp: Utc::now(),
            severity: event.severity(),
            event,
        };
        let kind = envelope.kind();

        let targets: Vec<Listener> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|registration| registration.kind.map_or(true, |k| k == kind))
            .map(|registration| Arc::clone(&registration.listener))
            .collect();

        for listener in targets {
            if catch_unwind(AssertUnwindSafe(|| listener(&envelope))).is_err() {
                warn!(event = %kind, sequence = %sequence, "event listener panicked");
            }
        }

        // No subscribers is fine
        let _ = self.sender.send(envelope);
        sequence
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    /// Get the current sequence number.
    pub fn current_sequence(&self) -> SequenceNumber {
        SequenceNumber(self.sequence.load(Ordering::SeqCst))
    }

    /// Get the number of active stream subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EventBusConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_event_kind_names_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
        assert!("task:exploded".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_listeners_receive_only_their_kind_in_order() {
        let bus = EventBus::default();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&seen);
        bus.on(EventKind::ProcessorStarted, move |_| {
            first.lock().unwrap().push("first");
        });
        let second = Arc::clone(&seen);
        bus.on(EventKind::ProcessorStarted, move |_| {
            second.lock().unwrap().push("second");
        });
        let other = Arc::clone(&seen);
        bus.on(EventKind::ProcessorPaused, move |_| {
            other.lock().unwrap().push("paused");
        });

        bus.publish(ProcessorEvent::ProcessorStarted);
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let bus = EventBus::default();
        let calls = Arc::new(AtomicU64::new(0));

        bus.on(EventKind::TaskRemoved, |_| panic!("listener bug"));
        let counter = Arc::clone(&calls);
        bus.on(EventKind::TaskRemoved, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(ProcessorEvent::TaskRemoved { task_id: TaskId(1) });
        bus.publish(ProcessorEvent::TaskRemoved { task_id: TaskId(2) });
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_off_removes_listener() {
        let bus = EventBus::default();
        let id = bus.on(EventKind::ConfigUpdated, |_| {});
        bus.on_any(|_| {});

        assert_eq!(bus.listener_count(EventKind::ConfigUpdated), 2);
        assert!(bus.off(id));
        assert!(!bus.off(id));
        assert_eq!(bus.listener_count(EventKind::ConfigUpdated), 1);
    }

    #[tokio::test]
    async fn test_event_bus_sequence_assignment() {
        let bus = EventBus::default();
        assert_eq!(bus.current_sequence().0, 0);

        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish(ProcessorEvent::ProcessorStarted);
        let event1 = rx.recv().await.unwrap();
        assert_eq!(event1.sequence.0, 0);
        assert_eq!(event1.kind(), EventKind::ProcessorStarted);

        bus.publish(ProcessorEvent::ProcessorStopped);
        let event2 = rx.recv().await.unwrap();
        assert_eq!(event2.sequence.0, 1);

        assert_eq!(bus.current_sequence().0, 2);
    }

    #[test]
    fn test_event_metadata() {
        let event = ProcessorEvent::TaskRetrying {
            task_id: TaskId(4),
            attempt: 1,
            max_retries: 3,
            delay_ms: 100,
            error: "boom".into(),
        };
        assert_eq!(event.severity(), EventSeverity::Warning);
        assert_eq!(event.task_id(), Some(TaskId(4)));
        assert_eq!(ProcessorEvent::ProcessorPaused.task_id(), None);
    }
}
