//! Snapshot persistence boundary.
//!
//! # Responsibility
//! - Define the load/save contract the workspace uses to seed and flush the
//!   in-memory store.
//! - Provide a SQLite adapter and an in-memory adapter.
//!
//! # Invariants
//! - `save` is all-or-nothing: a failed save leaves the previous snapshot.
//! - `load` rejects invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::{Snapshot, ValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod sqlite;

pub use memory::MemorySnapshotStore;
pub use sqlite::SqliteSnapshotStore;

pub type PersistResult<T> = Result<T, PersistError>;

/// Whole-store persistence collaborator.
pub trait SnapshotStore {
    /// Reads the complete persisted state; an empty backend yields an empty snapshot.
    fn load(&self) -> PersistResult<Snapshot>;

    /// Atomically replaces the persisted state with `snapshot`.
    fn save(&mut self, snapshot: &Snapshot) -> PersistResult<()>;
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for Box<S> {
    fn load(&self) -> PersistResult<Snapshot> {
        (**self).load()
    }

    fn save(&mut self, snapshot: &Snapshot) -> PersistResult<()> {
        (**self).save(snapshot)
    }
}

#[derive(Debug)]
pub enum PersistError {
    Db(DbError),
    /// A stored value could not be decoded (bad uuid, status, timestamp...).
    InvalidData(String),
    /// A decoded record failed model validation.
    Validation(ValidationError),
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Validation(err) => write!(f, "invalid persisted record: {err}"),
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
            Self::Validation(err) => Some(err),
        }
    }
}

impl From<DbError> for PersistError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for PersistError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ValidationError> for PersistError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}
