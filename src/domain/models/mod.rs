pub mod config;
pub mod queue;
pub mod result;
pub mod snapshot;
pub mod statistics;
pub mod task;

pub use config::{
    AppConfig, ConfigUpdate, LoggingConfig, ProcessorConfig, ProcessorPreset, RetryStrategy,
    MAX_CONCURRENT_LIMIT,
};
pub use queue::DispatchQueue;
pub use result::ProcessingResult;
pub use snapshot::StateSnapshot;
pub use statistics::Statistics;
pub use task::{NewTask, Task, TaskId, TaskOptions, TaskPriority, TaskStatus};
