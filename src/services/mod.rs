//! Engine services: the batch processor and the components it is built from.

pub mod batch_processor;
pub mod event_bus;
pub mod handler_registry;
pub mod retry_controller;
pub mod task_store;

pub use batch_processor::{BatchProcessor, BatchProcessorBuilder};
pub use event_bus::{
    EventBus, EventBusConfig, EventEnvelope, EventId, EventKind, EventSeverity, ListenerId,
    ProcessorEvent, SequenceNumber,
};
pub use handler_registry::HandlerRegistry;
pub use retry_controller::{RetryController, RetryDecision};
pub use task_store::TaskStore;
