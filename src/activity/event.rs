//! Raw change events as delivered by the watcher.

use std::fmt;

/// OS-level change kind reported alongside a changed path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
    Renamed,
    /// Access, metadata-only or platform-specific events.
    Other,
}

/// One changed path, relative to the watched root.
///
/// Ephemeral: produced per watcher callback and consumed by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: String,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(path: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Shorthand for a `Modified` event.
    pub fn modified(path: impl Into<String>) -> Self {
        Self::new(path, ChangeKind::Modified)
    }
}

impl AsRef<str> for ChangeEvent {
    fn as_ref(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {}", self.kind, self.path)
    }
}
