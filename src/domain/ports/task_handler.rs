//! Task handler port - the contract media operations implement.

use async_trait::async_trait;
use std::future::Future;

use crate::domain::models::{ProcessingResult, Task};

/// Performs the actual work for one operation kind.
///
/// A handler fails an attempt by returning `Err` or a result with
/// `success = false`. Panics are caught and treated as failures too.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, task: Task) -> anyhow::Result<ProcessingResult>;
}

/// Adapter turning an async closure into a [`TaskHandler`].
pub struct FnHandler<F> {
    func: F,
}

impl<F> FnHandler<F> {
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F, Fut> TaskHandler for FnHandler<F>
where
    F: Fn(Task) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<ProcessingResult>> + Send,
{
    async fn handle(&self, task: Task) -> anyhow::Result<ProcessingResult> {
        (self.func)(task).await
    }
}

/// Wrap an async closure as a handler.
///
/// ```
/// use batchq::domain::models::ProcessingResult;
/// use batchq::domain::ports::handler_fn;
///
/// let handler = handler_fn(|task| async move { Ok(ProcessingResult::success(task.id)) });
/// # let _ = handler;
/// ```
pub const fn handler_fn<F, Fut>(func: F) -> FnHandler<F>
where
    F: Fn(Task) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<ProcessingResult>> + Send,
{
    FnHandler::new(func)
}
