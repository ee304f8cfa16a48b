//! Core data layer for tasktrack.
//! Owns tasks, projects and tags in memory, keeps query indexes current and
//! answers filtered, sorted searches. Persistence is a pluggable snapshot store.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod persist;
pub mod search;
pub mod service;
pub mod store;
pub mod workspace;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::{
    Priority, Project, ProjectId, Snapshot, Tag, TagId, Task, TaskId, TaskStatus,
    ValidationError,
};
pub use persist::{
    MemorySnapshotStore, PersistError, PersistResult, SnapshotStore, SqliteSnapshotStore,
};
pub use search::{
    parse_query, search, SortDirection, SortField, SortSpec, TaskFilter, TaskView,
};
pub use service::project_service::{NewProject, ProjectPatch, ProjectService};
pub use service::tag_service::{NewTag, TagPatch, TagService};
pub use service::task_service::{NewTask, TaskPatch, TaskService};
pub use service::{ServiceError, ServiceResult};
pub use store::EntityStore;
pub use workspace::{Workspace, WorkspaceError, WorkspaceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
