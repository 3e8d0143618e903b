//! Handler trait and change descriptors for repository activity.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{ActivityError, RepositoryId};

/// Classification carried by a [`ChangeDescriptor`].
///
/// The dispatcher only synthesizes `Changed`: path detail is not preserved
/// past aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeClass {
    Changed,
    Created,
    Deleted,
    Renamed,
}

/// What a repository handler is told about activity in its tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeDescriptor {
    pub repository: RepositoryId,
    pub class: ChangeClass,
    /// Originating path, `None` when it was not preserved.
    pub origin: Option<String>,
}

impl ChangeDescriptor {
    /// Descriptor for "something in this repository changed".
    pub fn changed(repository: RepositoryId) -> Self {
        Self {
            repository,
            class: ChangeClass::Changed,
            origin: None,
        }
    }

    /// Originating path, or `"unspecified"`.
    pub fn origin_or_unspecified(&self) -> &str {
        self.origin.as_deref().unwrap_or("unspecified")
    }
}

impl fmt::Display for ChangeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:?} ({})",
            self.repository,
            self.class,
            self.origin_or_unspecified()
        )
    }
}

/// A registered repository's activity handler.
///
/// The dispatcher may call `notify_activity` again for the same repository
/// while an earlier call is still running. Handlers that cannot tolerate
/// overlap should wrap themselves in [`SerializedRepository`].
#[async_trait]
pub trait RepositoryHandle: Send + Sync {
    /// Handler name for logging.
    fn name(&self) -> &str;

    /// Called once per batch that touched this repository.
    async fn notify_activity(&self, descriptor: ChangeDescriptor) -> Result<(), ActivityError>;
}

/// Runs notifications for one repository strictly one after another.
///
/// Notifications for different repositories stay independent: each wrapper
/// owns its own lock.
pub struct SerializedRepository<H> {
    inner: H,
    gate: Mutex<()>,
}

impl<H: RepositoryHandle> SerializedRepository<H> {
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            gate: Mutex::new(()),
        }
    }

    pub fn into_handle(self) -> Arc<dyn RepositoryHandle>
    where
        H: 'static,
    {
        Arc::new(self)
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }
}

#[async_trait]
impl<H: RepositoryHandle> RepositoryHandle for SerializedRepository<H> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn notify_activity(&self, descriptor: ChangeDescriptor) -> Result<(), ActivityError> {
        let _turn = self.gate.lock().await;
        self.inner.notify_activity(descriptor).await
    }
}
