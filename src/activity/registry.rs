//! Concurrent mapping from repository name to its activity handler.
//!
//! Read by every dispatch and mutated by repository add/remove at the same
//! time. A lookup that loses a race with `unregister` simply misses.

use std::sync::Arc;

use dashmap::DashMap;

use super::{RepositoryHandle, RepositoryId};

#[derive(Default)]
pub struct RepositoryRegistry {
    handles: DashMap<RepositoryId, Arc<dyn RepositoryHandle>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, returning the one it replaced.
    pub fn register(
        &self,
        id: RepositoryId,
        handle: Arc<dyn RepositoryHandle>,
    ) -> Option<Arc<dyn RepositoryHandle>> {
        crate::debug_event!("registry", "register", "{id} -> {}", handle.name());
        self.handles.insert(id, handle)
    }

    pub fn unregister(&self, id: &str) -> Option<Arc<dyn RepositoryHandle>> {
        let removed = self.handles.remove(id).map(|(_, handle)| handle);
        if removed.is_some() {
            crate::debug_event!("registry", "unregister", "{id}");
        }
        removed
    }

    /// Clone the handle out so no shard lock is held while it runs.
    pub fn lookup(&self, id: &str) -> Option<Arc<dyn RepositoryHandle>> {
        self.handles.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.handles.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Snapshot of registered ids, sorted.
    pub fn ids(&self) -> Vec<RepositoryId> {
        let mut ids: Vec<_> = self.handles.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }
}

impl std::fmt::Debug for RepositoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryRegistry")
            .field("repositories", &self.ids())
            .finish()
    }
}
