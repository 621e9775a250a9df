//! Registry mapping operation names to task handlers.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::ports::TaskHandler;

/// Operation name → handler.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn TaskHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, returning the one it replaced.
    pub fn register(
        &mut self,
        operation: impl Into<String>,
        handler: Arc<dyn TaskHandler>,
    ) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.insert(operation.into(), handler)
    }

    pub fn unregister(&mut self, operation: &str) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.remove(operation)
    }

    pub fn contains(&self, operation: &str) -> bool {
        self.handlers.contains_key(operation)
    }

    pub fn get(&self, operation: &str) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.get(operation).cloned()
    }

    /// Registered operation names, sorted.
    pub fn operations(&self) -> Vec<String> {
        let mut operations: Vec<String> = self.handlers.keys().cloned().collect();
        operations.sort();
        operations
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
