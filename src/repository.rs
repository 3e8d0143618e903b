//! Default repository handler used by the `watch` command.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::activity::{ActivityError, ChangeDescriptor, RepositoryHandle};
use crate::main_context::MainContextInvoker;
use crate::workspace::DiscoveredRepository;

/// Logs activity and reports it as a status line on the main context.
///
/// Stands in for the synchronization backend: it records that a repository
/// went dirty and leaves the rest to whatever consumes the status line.
pub struct ActivityLog {
    name: String,
    path: PathBuf,
    main: Option<MainContextInvoker>,
    notifications: AtomicU64,
}

impl ActivityLog {
    pub fn new(repository: &DiscoveredRepository) -> Self {
        Self {
            name: repository.id.to_string(),
            path: repository.path.clone(),
            main: None,
            notifications: AtomicU64::new(0),
        }
    }

    pub fn with_main_context(mut self, invoker: MainContextInvoker) -> Self {
        self.main = Some(invoker);
        self
    }

    pub fn notifications(&self) -> u64 {
        self.notifications.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepositoryHandle for ActivityLog {
    fn name(&self) -> &str {
        &self.name
    }

    async fn notify_activity(&self, descriptor: ChangeDescriptor) -> Result<(), ActivityError> {
        let metadata = match tokio::fs::metadata(&self.path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ActivityError::Unavailable {
                    repository: descriptor.repository,
                });
            }
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_dir() {
            return Err(ActivityError::Unavailable {
                repository: descriptor.repository,
            });
        }

        let count = self.notifications.fetch_add(1, Ordering::SeqCst) + 1;
        crate::log_event!("repository", "activity", "{descriptor} #{count}");

        if let Some(main) = &self.main {
            let line = format!("{} changed ({count} notifications)", descriptor.repository);
            main.invoke(move || println!("{line}"))
                .map_err(|e| ActivityError::handler_failed(&descriptor.repository, e.to_string()))?;
        }

        Ok(())
    }
}
