pub mod activity;
pub mod config;
pub mod logging;
pub mod main_context;
pub mod repository;
pub mod watcher;
pub mod workspace;

pub use activity::{
    ActivityEngine, ActivityError, ChangeClass, ChangeDescriptor, ChangeEvent, ChangeKind,
    Dispatcher, RepositoryHandle, RepositoryId, RepositoryRegistry, SerializedRepository,
    TriggeredSet, aggregate, resolve_repository,
};
pub use config::Settings;
pub use main_context::{InvokeError, MainContext, MainContextInvoker};
pub use repository::ActivityLog;
pub use watcher::{RootWatcher, WatchError};
pub use workspace::{DiscoveredRepository, RepositoryScanner, WorkspaceError};
