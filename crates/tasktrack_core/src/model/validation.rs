//! Validation failures shared by all entity kinds.

use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Rejection reason for an entity value or an entity change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Entity ids must never be the nil UUID.
    NilId,
    /// Task title is blank after trim.
    EmptyTitle,
    /// Project or tag name is blank after trim.
    EmptyName,
    /// Priority outside `1..=5`.
    InvalidPriority(u8),
    /// `completed_at` presence disagrees with `status == done`.
    CompletionMismatch { done: bool, has_completed_at: bool },
    /// Tag color is not `#rgb` or `#rrggbb`.
    InvalidColor(String),
    /// A task lists the same tag id more than once.
    DuplicateTagId(Uuid),
    /// Another tag already owns this name (case-insensitive).
    DuplicateTagName(String),
    /// Project would become its own ancestor.
    ProjectCycle { project_id: Uuid, parent_id: Uuid },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "id must not be nil"),
            Self::EmptyTitle => write!(f, "task title must not be blank"),
            Self::EmptyName => write!(f, "name must not be blank"),
            Self::InvalidPriority(value) => {
                write!(f, "priority {value} is out of range 1..=5")
            }
            Self::CompletionMismatch {
                done,
                has_completed_at,
            } => write!(
                f,
                "completed_at present={has_completed_at} does not match status done={done}"
            ),
            Self::InvalidColor(value) => {
                write!(f, "invalid color `{value}`; expected #rgb or #rrggbb")
            }
            Self::DuplicateTagId(id) => write!(f, "tag {id} is listed more than once"),
            Self::DuplicateTagName(name) => write!(f, "tag name already in use: `{name}`"),
            Self::ProjectCycle {
                project_id,
                parent_id,
            } => write!(
                f,
                "project {project_id} cannot be placed under {parent_id}: cycle"
            ),
        }
    }
}

impl Error for ValidationError {}
