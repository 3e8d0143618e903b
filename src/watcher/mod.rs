//! Filesystem watcher feeding the activity engine.
//!
//! A single recursive `notify::RecommendedWatcher` on the watched root. Raw
//! events become root-relative [`ChangeEvent`](crate::activity::ChangeEvent)s
//! and are grouped into batches on a dedicated delivery thread.
//!
//! ```text
//! notify callback --(crossbeam channel)--> delivery thread --batch--> callback
//! ```

mod error;
mod root;

pub use error::WatchError;
pub use root::{RootWatcher, change_kind, relative_path};
