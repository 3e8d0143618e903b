//! Sync root bootstrap and repository lifecycle.
//!
//! Keeps the [`RepositoryRegistry`] in step with the top-level directories of
//! the sync root by polling it; added directories get a handler from the
//! caller's factory, vanished ones are unregistered.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::interval;

use crate::activity::{RepositoryHandle, RepositoryId, RepositoryRegistry, resolve_repository};

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WorkspaceError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        WorkspaceError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A top-level directory of the sync root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredRepository {
    pub id: RepositoryId,
    pub path: PathBuf,
}

/// Create the sync root if it is missing, owner-only on Unix.
///
/// Returns `true` if the directory was created.
pub fn ensure_root(root: &Path) -> Result<bool, WorkspaceError> {
    if root.is_dir() {
        return Ok(false);
    }

    std::fs::create_dir_all(root).map_err(|e| WorkspaceError::io(root, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(root, std::fs::Permissions::from_mode(0o700))
            .map_err(|e| WorkspaceError::io(root, e))?;
    }

    crate::log_event!("workspace", "created root", "{}", root.display());
    Ok(true)
}

/// List the repositories under `root`, sorted by id.
///
/// Hidden entries and plain files are skipped. Ids are resolved the same way
/// changed paths are, so `photos.git/` registers as `photos`.
pub fn discover_repositories(root: &Path) -> Result<Vec<DiscoveredRepository>, WorkspaceError> {
    let entries = std::fs::read_dir(root).map_err(|e| WorkspaceError::io(root, e))?;
    let mut found = BTreeMap::new();

    for entry in entries {
        let entry = entry.map_err(|e| WorkspaceError::io(root, e))?;
        let file_type = entry.file_type().map_err(|e| WorkspaceError::io(&entry.path(), e))?;
        if !file_type.is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }

        let id = resolve_repository(&name);
        found.entry(id.clone()).or_insert(DiscoveredRepository {
            id,
            path: entry.path(),
        });
    }

    Ok(found.into_values().collect())
}

/// Builds the handler for a newly discovered repository.
pub type HandleFactory =
    Arc<dyn Fn(&DiscoveredRepository) -> Arc<dyn RepositoryHandle> + Send + Sync>;

/// Outcome of one scan.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub added: Vec<RepositoryId>,
    pub removed: Vec<RepositoryId>,
}

/// Polls the sync root and updates the registry.
pub struct RepositoryScanner {
    root: PathBuf,
    registry: Arc<RepositoryRegistry>,
    factory: HandleFactory,
    check_interval: Duration,
}

impl RepositoryScanner {
    pub fn new(
        root: impl Into<PathBuf>,
        registry: Arc<RepositoryRegistry>,
        factory: HandleFactory,
    ) -> Self {
        Self {
            root: root.into(),
            registry,
            factory,
            check_interval: Duration::from_secs(5),
        }
    }

    pub fn with_interval(mut self, check_interval: Duration) -> Self {
        self.check_interval = check_interval;
        self
    }

    /// Run one discovery pass.
    pub fn sync_once(&self) -> Result<ScanReport, WorkspaceError> {
        let discovered = discover_repositories(&self.root)?;
        let mut report = ScanReport::default();

        for repository in &discovered {
            if !self.registry.contains(repository.id.as_str()) {
                self.registry
                    .register(repository.id.clone(), (self.factory)(repository));
                report.added.push(repository.id.clone());
            }
        }

        for id in self.registry.ids() {
            if !discovered.iter().any(|repository| repository.id == id) {
                self.registry.unregister(id.as_str());
                report.removed.push(id);
            }
        }

        for id in &report.added {
            crate::log_event!("workspace", "repository added", "{id}");
        }
        for id in &report.removed {
            crate::log_event!("workspace", "repository removed", "{id}");
        }

        Ok(report)
    }

    /// Poll until the task is dropped.
    pub async fn watch(self) {
        let mut ticker = interval(self.check_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            if let Err(e) = self.sync_once() {
                tracing::error!("[workspace] repository scan failed: {e}");
            }
        }
    }
}
