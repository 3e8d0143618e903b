//! Fire-and-forget dispatch of activity notifications.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::runtime::Handle;

use super::{ChangeDescriptor, RepositoryHandle, RepositoryRegistry, TriggeredSet};

/// Launches one independent task per triggered, registered repository.
///
/// Never waits for the tasks it starts and imposes no ordering between them.
/// Two batches touching the same repository may produce overlapping
/// notifications; serializing those is up to the handler
/// (see [`SerializedRepository`](super::SerializedRepository)).
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<RepositoryRegistry>,
    runtime: Handle,
    in_flight: Arc<AtomicUsize>,
}

/// Decrements the in-flight counter however the task ends.
struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Dispatcher {
    /// Create a dispatcher spawning onto `runtime`.
    ///
    /// Takes an explicit runtime handle because `dispatch` is called from the
    /// watcher's delivery thread, which is not a runtime worker.
    pub fn new(registry: Arc<RepositoryRegistry>, runtime: Handle) -> Self {
        Self {
            registry,
            runtime,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of notifications currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Notify every registered repository in `triggered`.
    ///
    /// Returns the number of tasks launched. Ids with no registered handle
    /// are skipped without error.
    pub fn dispatch(&self, triggered: &TriggeredSet) -> usize {
        let mut launched = 0;

        for id in triggered {
            let Some(handle) = self.registry.lookup(id.as_str()) else {
                crate::debug_event!("dispatch", "skipped", "{id} is not registered");
                continue;
            };

            self.launch(handle, ChangeDescriptor::changed(id.clone()));
            launched += 1;
        }

        if launched > 0 {
            crate::debug_event!(
                "dispatch",
                "launched",
                "{launched} of {} triggered ({} in flight)",
                triggered.len(),
                self.in_flight()
            );
        }

        launched
    }

    fn launch(&self, handle: Arc<dyn RepositoryHandle>, descriptor: ChangeDescriptor) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlight(Arc::clone(&self.in_flight));
        let repository = descriptor.repository.clone();
        let handler_name = handle.name().to_string();

        let task = self.runtime.spawn(async move {
            let _guard = guard;
            handle.notify_activity(descriptor).await
        });

        // Observe the outcome off the delivery thread; a failure or panic
        // stays inside this pair of tasks.
        self.runtime.spawn(async move {
            match task.await {
                Ok(Ok(())) => {
                    crate::debug_event!("dispatch", "completed", "{repository}");
                }
                Ok(Err(e)) => {
                    tracing::error!("[dispatch] {handler_name} failed for {repository}: {e}");
                }
                Err(e) if e.is_panic() => {
                    tracing::error!("[dispatch] {handler_name} panicked for {repository}");
                }
                Err(e) => {
                    tracing::warn!("[dispatch] task for {repository} did not finish: {e}");
                }
            }
        });
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}
