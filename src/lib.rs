//! batchq - In-process batch task processor
//!
//! batchq accepts media-processing tasks (transcode, compress, thumbnail,
//! text-to-speech, ...), queues them by priority, runs them through
//! registered async handlers under a concurrency cap, retries failures with
//! backoff, and reports progress through a typed event stream.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): Task models, configuration, errors, ports
//! - **Service Layer** (`services`): The [`BatchProcessor`] engine and its parts
//! - **Adapters** (`adapters`): File-backed state snapshots
//! - **Infrastructure Layer** (`infrastructure`): Config loading and logging
//! - **CLI Layer** (`cli`): Operator commands over snapshots and presets
//!
//! # Example
//!
//! ```no_run
//! use batchq::{handler_fn, BatchProcessor, ProcessingResult, ProcessorPreset, TaskOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let processor = BatchProcessor::with_preset(ProcessorPreset::Development)?;
//!     processor.register_handler(
//!         "thumbnail",
//!         handler_fn(|task| async move { Ok(ProcessingResult::success(task.id)) }),
//!     );
//!
//!     processor.add_task("thumbnail", "clip.mp4", "thumb.png", TaskOptions::default());
//!     processor.start();
//!     processor.stop().await;
//!     println!("{:?}", processor.get_statistics());
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use adapters::FileStateStore;
pub use domain::errors::{ConfigError, ProcessorError, ProcessorResult};
pub use domain::models::{
    AppConfig, ConfigUpdate, NewTask, ProcessingResult, ProcessorConfig, ProcessorPreset,
    RetryStrategy, StateSnapshot, Statistics, Task, TaskId, TaskOptions, TaskPriority, TaskStatus,
};
pub use domain::ports::{handler_fn, StateStore, TaskHandler};
pub use infrastructure::config::ConfigLoader;
pub use services::{BatchProcessor, EventEnvelope, EventKind, ProcessorEvent};
