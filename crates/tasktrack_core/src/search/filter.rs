//! Structured task filter and sort specification.
//!
//! # Responsibility
//! - Describe one query as explicit optional constraints.
//! - Normalize caller input once, before the engine runs.
//!
//! # Invariants
//! - `None` means "no constraint from this category", never "must be absent".
//! - After [`TaskFilter::normalized`], no field holds an empty set or blank text.

use crate::model::{Priority, ProjectId, TagId, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Field used to order hydrated results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Title,
    Priority,
    CreatedAt,
    UpdatedAt,
    DueAt,
}

impl SortField {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "title" => Some(Self::Title),
            "priority" => Some(Self::Priority),
            "created" | "created_at" | "createdat" => Some(Self::CreatedAt),
            "updated" | "updated_at" | "updatedat" => Some(Self::UpdatedAt),
            "due" | "due_at" | "dueat" => Some(Self::DueAt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Asc),
            "desc" | "descending" => Some(Self::Desc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    pub fn asc(field: SortField) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    pub fn desc(field: SortField) -> Self {
        Self::new(field, SortDirection::Desc)
    }

    /// Parses `field` or `field:dir`; direction defaults to ascending.
    pub fn parse(value: &str) -> Option<Self> {
        let (field, direction) = match value.split_once(':') {
            Some((field, direction)) => (field, SortDirection::parse(direction)?),
            None => (value, SortDirection::Asc),
        };
        Some(Self::new(SortField::parse(field)?, direction))
    }
}

/// Query over tasks. Index-backed categories are OR'ed within and AND'ed across.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskFilter {
    /// Case-insensitive substring matched against title or notes.
    pub text: Option<String>,
    /// Tasks whose title or notes contain any of these terms are dropped.
    pub exclude_text: Option<Vec<String>>,
    pub statuses: Option<BTreeSet<TaskStatus>>,
    pub priorities: Option<BTreeSet<Priority>>,
    pub tags: Option<BTreeSet<TagId>>,
    pub project_id: Option<ProjectId>,
    /// Inclusive due-date cutoff; tasks without a due date never match.
    pub due_before: Option<DateTime<Utc>>,
    pub sort: Option<SortSpec>,
    /// Applied after sorting.
    pub limit: Option<usize>,
}

impl TaskFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = TaskStatus>) -> Self {
        self.statuses = Some(statuses.into_iter().collect());
        self
    }

    pub fn with_priorities(mut self, priorities: impl IntoIterator<Item = Priority>) -> Self {
        self.priorities = Some(priorities.into_iter().collect());
        self
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = TagId>) -> Self {
        self.tags = Some(tags.into_iter().collect());
        self
    }

    pub fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn with_due_before(mut self, cutoff: DateTime<Utc>) -> Self {
        self.due_before = Some(cutoff);
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Collapses blank text and empty sets to `None` and lower-cases exclusion terms.
    pub fn normalized(mut self) -> Self {
        self.text = self
            .text
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        self.exclude_text = self
            .exclude_text
            .map(|terms| {
                let unique = terms
                    .iter()
                    .map(|term| term.trim().to_lowercase())
                    .filter(|term| !term.is_empty())
                    .collect::<BTreeSet<_>>();
                unique.into_iter().collect::<Vec<_>>()
            })
            .filter(|terms| !terms.is_empty());
        self.statuses = self.statuses.filter(|set| !set.is_empty());
        self.priorities = self.priorities.filter(|set| !set.is_empty());
        self.tags = self.tags.filter(|set| !set.is_empty());
        self
    }

    /// Whether any index-backed category is constrained.
    pub fn has_index_constraints(&self) -> bool {
        self.statuses.is_some()
            || self.priorities.is_some()
            || self.tags.is_some()
            || self.project_id.is_some()
    }

    pub fn is_unconstrained(&self) -> bool {
        !self.has_index_constraints()
            && self.text.is_none()
            && self.exclude_text.is_none()
            && self.due_before.is_none()
    }
}
