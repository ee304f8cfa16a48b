//! Core use-case services.
//!
//! # Responsibility
//! - Provide create/update/remove/get entry points per entity kind.
//! - Validate input and check existence before touching the store.
//!
//! # Invariants
//! - A NotFound or validation failure leaves the store (and its indexes)
//!   untouched.
//! - Services borrow the one `EntityStore` explicitly; they own no state.

use crate::model::{ProjectId, TagId, TaskId, ValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod project_service;
pub mod tag_service;
pub mod task_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure returned by service operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    TaskNotFound(TaskId),
    ProjectNotFound(ProjectId),
    TagNotFound(TagId),
    Validation(ValidationError),
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TaskNotFound(_) | Self::ProjectNotFound(_) | Self::TagNotFound(_)
        )
    }

    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TaskNotFound(_) => "task_not_found",
            Self::ProjectNotFound(_) => "project_not_found",
            Self::TagNotFound(_) => "tag_not_found",
            Self::Validation(_) => "validation_failed",
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::TagNotFound(id) => write!(f, "tag not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

fn normalize_required_text(value: &str, empty: ValidationError) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(empty);
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
