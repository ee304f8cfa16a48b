//! Project domain model.
//!
//! Projects form a forest through `parent_id`; siblings are ordered by `order`.
//! Depth is not bounded. Cycle prevention lives in the project service.

use super::validation::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable project identifier.
pub type ProjectId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// Sort key among siblings; lower comes first.
    pub order: i64,
    pub parent_id: Option<ProjectId>,
}

impl Project {
    /// Creates a root-level project with a generated id.
    pub fn new(name: impl Into<String>, order: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            order,
            parent_id: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_nil() {
            return Err(ValidationError::NilId);
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(())
    }
}
