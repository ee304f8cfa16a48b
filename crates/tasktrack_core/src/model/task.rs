//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record and its status/priority value types.
//! - Own the status transition rule for `completed_at`.
//! - Derive time-relative fields (overdue, days until due) from a given instant.
//!
//! # Invariants
//! - `completed_at.is_some()` iff `status == TaskStatus::Done`.
//! - `priority` is always within `1..=5` (enforced by `Priority`).
//! - `id` is never nil and never reused for another task.
//! - `tag_ids` holds each tag id at most once.
//! - Deserialized values pass `Task::validate()`.

use super::project::ProjectId;
use super::tag::TagId;
use super::validation::ValidationError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Stable task identifier.
pub type TaskId = Uuid;

/// Task lifecycle state.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Captured but not started.
    #[default]
    Todo,
    /// Work in progress.
    Doing,
    /// Completed; the only status carrying `completed_at`.
    Done,
    /// Kept for history, no longer actionable.
    Archived,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [Self::Todo, Self::Doing, Self::Done, Self::Archived];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::Doing => "doing",
            Self::Done => "done",
            Self::Archived => "archived",
        }
    }

    /// Parses the lowercase wire name, ignoring surrounding whitespace and case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "todo" => Some(Self::Todo),
            "doing" => Some(Self::Doing),
            "done" => Some(Self::Done),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

/// Urgency level, `1` being the most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const HIGHEST: Priority = Priority(1);
    pub const NORMAL: Priority = Priority(3);
    pub const LOWEST: Priority = Priority(5);

    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if (1..=5).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::InvalidPriority(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// All five levels, most urgent first.
    pub fn all() -> impl Iterator<Item = Priority> {
        (1..=5).map(Priority)
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl TryFrom<u8> for Priority {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Priority> for u8 {
    fn from(value: Priority) -> Self {
        value.0
    }
}

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTask")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub notes: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    /// May reference a project that no longer exists.
    pub project_id: Option<ProjectId>,
    /// May reference tags that no longer exist.
    pub tag_ids: Vec<TagId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub due_at: Option<DateTime<Utc>>,
    /// Set iff `status == Done`; maintained by [`Task::set_status`].
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates a `todo` task with a generated id and `created_at = updated_at = now`.
    pub fn new(title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            notes: None,
            status: TaskStatus::Todo,
            priority: Priority::default(),
            project_id: None,
            tag_ids: Vec::new(),
            created_at: now,
            updated_at: now,
            due_at: None,
            completed_at: None,
        }
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_nil() {
            return Err(ValidationError::NilId);
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        let done = self.status == TaskStatus::Done;
        let has_completed_at = self.completed_at.is_some();
        if done != has_completed_at {
            return Err(ValidationError::CompletionMismatch {
                done,
                has_completed_at,
            });
        }
        let mut seen = HashSet::with_capacity(self.tag_ids.len());
        if let Some(duplicate) = self.tag_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(ValidationError::DuplicateTagId(*duplicate));
        }
        Ok(())
    }

    /// Drops repeated tag ids, keeping the first occurrence of each.
    pub fn dedupe_tag_ids(&mut self) {
        let mut seen = HashSet::with_capacity(self.tag_ids.len());
        self.tag_ids.retain(|id| seen.insert(*id));
    }

    /// Applies a status transition and keeps `completed_at` in lockstep.
    ///
    /// Re-entering `done` from `done` keeps the original completion instant.
    pub fn set_status(&mut self, status: TaskStatus, now: DateTime<Utc>) {
        match (self.status, status) {
            (TaskStatus::Done, TaskStatus::Done) => {}
            (_, TaskStatus::Done) => self.completed_at = Some(now),
            _ => self.completed_at = None,
        }
        self.status = status;
    }

    /// Whether the task is overdue at `now`: has a due date in the past and is not done.
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        match self.due_at {
            Some(due_at) => due_at < now && self.status != TaskStatus::Done,
            None => false,
        }
    }

    /// Whole days until `due_at`, rounded up; negative once the due date has passed.
    pub fn days_until_due(&self, now: DateTime<Utc>) -> Option<i64> {
        self.due_at.map(|due_at| {
            let remaining = due_at - now;
            // `num_days` truncates toward zero; a positive partial day rounds up.
            let days = remaining.num_days();
            if remaining > Duration::days(days) {
                days + 1
            } else {
                days
            }
        })
    }
}

#[derive(Deserialize)]
struct RawTask {
    id: TaskId,
    title: String,
    #[serde(default)]
    notes: Option<String>,
    status: TaskStatus,
    priority: Priority,
    #[serde(default)]
    project_id: Option<ProjectId>,
    #[serde(default)]
    tag_ids: Vec<TagId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<RawTask> for Task {
    type Error = ValidationError;

    fn try_from(raw: RawTask) -> Result<Self, Self::Error> {
        let task = Task {
            id: raw.id,
            title: raw.title,
            notes: raw.notes,
            status: raw.status,
            priority: raw.priority,
            project_id: raw.project_id,
            tag_ids: raw.tag_ids,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
            due_at: raw.due_at,
            completed_at: raw.completed_at,
        };
        task.validate()?;
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::{Priority, Task, TaskStatus};
    use crate::model::ValidationError;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    #[test]
    fn priority_rejects_out_of_range_levels() {
        assert_eq!(Priority::new(0), Err(ValidationError::InvalidPriority(0)));
        assert_eq!(Priority::new(6), Err(ValidationError::InvalidPriority(6)));
        assert_eq!(Priority::new(1).expect("priority should be in range"), Priority::HIGHEST);
        assert_eq!(Priority::all().count(), 5);
    }

    #[test]
    fn set_status_sets_and_clears_completed_at() {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).single().expect("valid timestamp");
        let mut task = Task::new("write report", now);

        task.set_status(TaskStatus::Done, now);
        assert_eq!(task.completed_at, Some(now));
        task.validate().expect("record should validate");

        let later = now + Duration::hours(1);
        task.set_status(TaskStatus::Done, later);
        assert_eq!(task.completed_at, Some(now));

        task.set_status(TaskStatus::Doing, later);
        assert_eq!(task.completed_at, None);
        task.validate().expect("record should validate");
    }

    #[test]
    fn days_until_due_uses_ceiling() {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).single().expect("valid timestamp");
        let mut task = Task::new("pay rent", now);
        assert_eq!(task.days_until_due(now), None);

        task.due_at = Some(now + Duration::hours(1));
        assert_eq!(task.days_until_due(now), Some(1));

        task.due_at = Some(now + Duration::days(2));
        assert_eq!(task.days_until_due(now), Some(2));

        task.due_at = Some(now + Duration::microseconds(500));
        assert_eq!(task.days_until_due(now), Some(1));

        task.due_at = Some(now);
        assert_eq!(task.days_until_due(now), Some(0));

        task.due_at = Some(now - Duration::hours(23));
        assert_eq!(task.days_until_due(now), Some(0));

        task.due_at = Some(now - Duration::hours(25));
        assert_eq!(task.days_until_due(now), Some(-1));
    }

    #[test]
    fn repeated_tag_id_fails_validation_and_deserialization() {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).single().expect("valid timestamp");
        let tag = Uuid::new_v4();
        let mut task = Task::new("file taxes", now);
        task.tag_ids = vec![tag, Uuid::new_v4(), tag];

        assert_eq!(task.validate(), Err(ValidationError::DuplicateTagId(tag)));

        let json = serde_json::to_string(&task).expect("task should serialize");
        let err = serde_json::from_str::<Task>(&json)
            .expect_err("repeated tag id must be rejected");
        assert!(err.to_string().contains("listed more than once"));
    }

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(TaskStatus::parse(" DOING "), Some(TaskStatus::Doing));
        assert_eq!(TaskStatus::parse("later"), None);
    }
}
