//! Domain model for tasks, projects and tags.
//!
//! # Responsibility
//! - Define canonical records owned by the entity store.
//! - Provide factories that assign ids and timestamps.
//! - Define the whole-store `Snapshot` exchanged with persistence.
//!
//! # Invariants
//! - Every entity is identified by a stable, non-nil UUID.
//! - Cross-entity references (task -> project/tag) are not enforced.

pub mod project;
pub mod tag;
pub mod task;
mod validation;

pub use project::{Project, ProjectId};
pub use tag::{normalize_tag_name, Tag, TagId};
pub use task::{Priority, Task, TaskId, TaskStatus};
pub use validation::ValidationError;

use serde::{Deserialize, Serialize};

/// Complete copy of all entity collections at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    pub projects: Vec<Project>,
    pub tags: Vec<Tag>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.projects.is_empty() && self.tags.is_empty()
    }
}
