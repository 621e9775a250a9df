pub mod state_store;
pub mod task_handler;

pub use state_store::StateStore;
pub use task_handler::{handler_fn, FnHandler, TaskHandler};
