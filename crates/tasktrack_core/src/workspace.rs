//! Workspace facade: one entity store, its clock and its persistence.
//!
//! # Responsibility
//! - Seed the entity store from a `SnapshotStore` and flush it back.
//! - Hand out services that borrow the store for one call chain.
//! - Apply the configured default ordering to searches.
//!
//! # Invariants
//! - The store changes only through services or `reload`.
//! - `reload` replaces all in-memory state and rebuilds every index.

use crate::clock::{Clock, SystemClock};
use crate::config::CoreConfig;
use crate::persist::{PersistError, SnapshotStore, SqliteSnapshotStore};
use crate::search::{parse_query, search, SortSpec, TaskFilter, TaskView};
use crate::service::project_service::ProjectService;
use crate::service::tag_service::TagService;
use crate::service::task_service::TaskService;
use crate::service::ServiceError;
use crate::store::EntityStore;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type WorkspaceResult<T> = Result<T, WorkspaceError>;

#[derive(Debug)]
pub enum WorkspaceError {
    Persist(PersistError),
    Service(ServiceError),
}

impl Display for WorkspaceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Persist(err) => write!(f, "{err}"),
            Self::Service(err) => write!(f, "{err}"),
        }
    }
}

impl Error for WorkspaceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Persist(err) => Some(err),
            Self::Service(err) => Some(err),
        }
    }
}

impl From<PersistError> for WorkspaceError {
    fn from(value: PersistError) -> Self {
        Self::Persist(value)
    }
}

impl From<ServiceError> for WorkspaceError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

pub struct Workspace<S: SnapshotStore, C: Clock = SystemClock> {
    store: EntityStore,
    persistence: S,
    clock: C,
    default_sort: Option<SortSpec>,
}

impl Workspace<SqliteSnapshotStore, SystemClock> {
    /// Opens the SQLite database named by `config` (in memory when unset).
    pub fn open_with_config(config: &CoreConfig) -> WorkspaceResult<Self> {
        let persistence = match config.database_path.as_deref() {
            Some(path) => SqliteSnapshotStore::open(path)?,
            None => SqliteSnapshotStore::open_in_memory()?,
        };
        let mut workspace = Self::open(persistence, SystemClock)?;
        workspace.default_sort = config.default_sort;
        Ok(workspace)
    }
}

impl<S: SnapshotStore, C: Clock> Workspace<S, C> {
    /// Loads the persisted snapshot into a fresh store.
    pub fn open(persistence: S, clock: C) -> WorkspaceResult<Self> {
        let snapshot = persistence.load()?;
        let store = EntityStore::from_snapshot(snapshot);
        info!(
            "event=workspace_open module=workspace status=ok tasks={} projects={} tags={}",
            store.task_count(),
            store.projects().count(),
            store.tags().count()
        );
        Ok(Self {
            store,
            persistence,
            clock,
            default_sort: None,
        })
    }

    pub fn with_default_sort(mut self, sort: Option<SortSpec>) -> Self {
        self.default_sort = sort;
        self
    }

    pub fn tasks(&mut self) -> TaskService<'_, &C> {
        TaskService::new(&mut self.store, &self.clock)
    }

    pub fn projects(&mut self) -> ProjectService<'_> {
        ProjectService::new(&mut self.store)
    }

    pub fn tags(&mut self) -> TagService<'_> {
        TagService::new(&mut self.store)
    }

    /// Read-only view of the entity store.
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn persistence(&self) -> &S {
        &self.persistence
    }

    /// Runs `filter`, falling back to the default sort when it has none.
    pub fn search(&self, filter: &TaskFilter) -> Vec<TaskView> {
        match (filter.sort, self.default_sort) {
            (None, Some(sort)) => {
                let filter = filter.clone().with_sort(sort);
                search(&self.store, &filter, self.clock.now())
            }
            _ => search(&self.store, filter, self.clock.now()),
        }
    }

    pub fn search_text(&self, query: &str) -> Vec<TaskView> {
        let filter = parse_query(query, &self.store, self.clock.now());
        self.search(&filter)
    }

    /// Writes the whole store through the persistence collaborator.
    pub fn save(&mut self) -> WorkspaceResult<()> {
        let snapshot = self.store.to_snapshot();
        self.persistence.save(&snapshot)?;
        Ok(())
    }

    /// Discards in-memory state and reloads it from persistence.
    ///
    /// On a load failure the current state is kept.
    pub fn reload(&mut self) -> WorkspaceResult<()> {
        let snapshot = self.persistence.load()?;
        self.store.replace_with_snapshot(snapshot);
        info!(
            "event=workspace_reload module=workspace status=ok tasks={}",
            self.store.task_count()
        );
        Ok(())
    }
}
