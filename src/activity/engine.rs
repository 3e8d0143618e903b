//! Watcher-facing entry point: aggregate a batch, then dispatch it.

use std::sync::Arc;

use tokio::runtime::Handle;

use super::{ChangeEvent, Dispatcher, RepositoryRegistry, aggregate};

#[derive(Debug, Clone)]
pub struct ActivityEngine {
    dispatcher: Dispatcher,
}

impl ActivityEngine {
    pub fn new(registry: Arc<RepositoryRegistry>, runtime: Handle) -> Self {
        Self {
            dispatcher: Dispatcher::new(registry, runtime),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Handle one watcher batch. Bounded time; returns the number of
    /// notifications launched.
    pub fn on_batch(&self, batch: &[ChangeEvent]) -> usize {
        let triggered = aggregate(batch);
        crate::debug_event!(
            "engine",
            "batch",
            "{} events -> {} repositories",
            batch.len(),
            triggered.len()
        );
        self.dispatcher.dispatch(&triggered)
    }
}
