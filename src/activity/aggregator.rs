//! Collapses a batch of changed paths into the repositories they touch.
//!
//! Every top-level entry under the watched root is a repository. A changed
//! path is attributed to the repository named by its first segment, with the
//! extension removed (`"photos.git/index"` belongs to `photos`).

use std::borrow::Borrow;
use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Normalized repository name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepositoryId(String);

impl RepositoryId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RepositoryId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RepositoryId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for RepositoryId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Resolve a root-relative path to the repository that owns it.
///
/// Total and pure: the same string always yields the same id. The first
/// segment is everything before the first separator (`/`, or the platform
/// separator); everything from its last `.` onwards is dropped.
pub fn resolve_repository(path: &str) -> RepositoryId {
    let segment = match path.find(std::path::is_separator) {
        Some(index) => &path[..index],
        None => path,
    };

    let name = match segment.rfind('.') {
        Some(index) => &segment[..index],
        None => segment,
    };

    RepositoryId::new(name)
}

/// Repositories touched by one batch, in first-seen order, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggeredSet {
    ids: IndexSet<RepositoryId>,
}

impl TriggeredSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an id; returns `false` if it was already present.
    pub fn insert(&mut self, id: RepositoryId) -> bool {
        self.ids.insert(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RepositoryId> {
        self.ids.iter()
    }

    pub fn into_vec(self) -> Vec<RepositoryId> {
        self.ids.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a TriggeredSet {
    type Item = &'a RepositoryId;
    type IntoIter = indexmap::set::Iter<'a, RepositoryId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

impl FromIterator<RepositoryId> for TriggeredSet {
    fn from_iter<T: IntoIterator<Item = RepositoryId>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// Aggregate one batch of changed paths into a [`TriggeredSet`].
///
/// Keeps no state between calls, so it can run concurrently on different
/// batches. Whether a repository is actually registered is not checked here.
pub fn aggregate<I, P>(batch: I) -> TriggeredSet
where
    I: IntoIterator<Item = P>,
    P: AsRef<str>,
{
    let mut triggered = TriggeredSet::new();
    for path in batch {
        triggered.insert(resolve_repository(path.as_ref()));
    }
    triggered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ChangeEvent;

    fn names(set: &TriggeredSet) -> Vec<&str> {
        set.iter().map(RepositoryId::as_str).collect()
    }

    #[test]
    fn test_resolve_takes_first_segment() {
        assert_eq!(resolve_repository("projD/x").as_str(), "projD");
        assert_eq!(resolve_repository("projD/a/b/c.txt").as_str(), "projD");
        assert_eq!(resolve_repository("projD").as_str(), "projD");
        assert_eq!(resolve_repository("projD/").as_str(), "projD");
    }

    #[test]
    fn test_resolve_strips_extension_once() {
        assert_eq!(resolve_repository("projC.git/index").as_str(), "projC");
        assert_eq!(resolve_repository("notes.txt").as_str(), "notes");
        assert_eq!(resolve_repository("archive.tar.gz/x").as_str(), "archive.tar");
    }

    #[test]
    fn test_resolve_edge_cases_never_fail() {
        assert_eq!(resolve_repository("").as_str(), "");
        assert_eq!(resolve_repository("/leading").as_str(), "");
        assert_eq!(resolve_repository(".hidden/file").as_str(), "");
        // A dot past the first separator is not part of the repository name
        assert_eq!(resolve_repository("proj/file.txt").as_str(), "proj");
    }

    #[test]
    fn test_aggregate_dedups_in_first_seen_order() {
        let batch = [
            "projA/file1.txt",
            "projA/file2.txt",
            "projB/readme",
            "projA/file3.txt",
        ];

        let triggered = aggregate(batch);
        assert_eq!(names(&triggered), vec!["projA", "projB"]);
    }

    #[test]
    fn test_aggregate_accepts_change_events() {
        let batch = vec![
            ChangeEvent::modified("docs/a.md"),
            ChangeEvent::modified("code.git/HEAD"),
            ChangeEvent::modified("docs/b.md"),
        ];

        let triggered = aggregate(&batch.iter().map(|e| e.path.as_str()).collect::<Vec<_>>());
        assert_eq!(names(&triggered), vec!["docs", "code"]);
        assert_eq!(aggregate(&batch), triggered);
    }

    #[test]
    fn test_aggregate_empty_batch() {
        let batch: Vec<String> = Vec::new();
        assert!(aggregate(batch).is_empty());
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let batch = ["z/1", "a/1", "m.git/x", "a/2", "z/3"];
        let first = aggregate(batch);
        for _ in 0..10 {
            assert_eq!(aggregate(batch), first);
        }
        assert_eq!(names(&first), vec!["z", "a", "m"]);
    }
}
