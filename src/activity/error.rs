//! Error types for repository activity handling.

use thiserror::Error;

use super::RepositoryId;

/// Errors raised by a repository's activity handler.
///
/// These never leave the dispatch task they occur in; the dispatcher logs
/// them and moves on.
#[derive(Error, Debug)]
pub enum ActivityError {
    #[error("Handler for '{repository}' failed: {reason}")]
    HandlerFailed {
        repository: RepositoryId,
        reason: String,
    },

    #[error("Repository '{repository}' is no longer available")]
    Unavailable { repository: RepositoryId },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ActivityError {
    pub fn handler_failed(repository: &RepositoryId, reason: impl Into<String>) -> Self {
        ActivityError::HandlerFailed {
            repository: repository.clone(),
            reason: reason.into(),
        }
    }
}
