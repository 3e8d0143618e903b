//! File-change aggregation and dispatch.
//!
//! Turns batches of changed paths into one "repository is dirty" signal per
//! repository per batch, and hands each signal to that repository's handler
//! without blocking the watcher.
//!
//! # Architecture
//!
//! ```text
//! RootWatcher delivery thread
//!   - batch of ChangeEvent
//!         |
//!   aggregate()            pure, first-seen order, deduplicated
//!         |
//!   TriggeredSet
//!         |
//!   Dispatcher::dispatch   RepositoryRegistry lookup, misses skipped
//!         |
//!    +---------+---------+
//!    |         |         |
//!  task      task      task      one tokio task per repository
//! ```

mod aggregator;
mod dispatcher;
mod engine;
mod error;
mod event;
mod handle;
mod registry;

pub use aggregator::{RepositoryId, TriggeredSet, aggregate, resolve_repository};
pub use dispatcher::Dispatcher;
pub use engine::ActivityEngine;
pub use error::ActivityError;
pub use event::{ChangeEvent, ChangeKind};
pub use handle::{ChangeClass, ChangeDescriptor, RepositoryHandle, SerializedRepository};
pub use registry::RepositoryRegistry;
