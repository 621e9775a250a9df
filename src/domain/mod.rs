//! Domain layer for the batch processor
//!
//! Models, ports, and errors shared by the engine services and adapters.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{ConfigError, ProcessorError, ProcessorResult};
