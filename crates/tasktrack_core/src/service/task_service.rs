//! Task use-case service.
//!
//! # Responsibility
//! - Create tasks through the `Task` factory with clock-assigned timestamps.
//! - Apply partial updates as full-record replacement in the store.
//! - Run structured and free-text searches as of the clock's current instant.
//!
//! # Invariants
//! - Status changes always go through `Task::set_status`.
//! - `updated_at` is bumped on every successful update.
//! - Tag ids are deduplicated, first occurrence wins.

use super::{normalize_optional_text, normalize_required_text, ServiceError, ServiceResult};
use crate::clock::Clock;
use crate::model::{Priority, ProjectId, TagId, Task, TaskId, TaskStatus, ValidationError};
use crate::search::{parse_query, search, TaskFilter, TaskView};
use crate::store::EntityStore;
use chrono::{DateTime, Utc};
use log::{info, warn};

/// Input for [`TaskService::create`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub notes: Option<String>,
    pub status: TaskStatus,
    /// `None` uses the default level (3).
    pub priority: Option<u8>,
    pub project_id: Option<ProjectId>,
    pub tag_ids: Vec<TagId>,
    pub due_at: Option<DateTime<Utc>>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Partial change for [`TaskService::update`]. `None` leaves a field unchanged;
/// `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub notes: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<u8>,
    pub project_id: Option<Option<ProjectId>>,
    pub tag_ids: Option<Vec<TagId>>,
    pub due_at: Option<Option<DateTime<Utc>>>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Task service over one borrowed entity store.
pub struct TaskService<'s, C: Clock> {
    store: &'s mut EntityStore,
    clock: C,
}

impl<'s, C: Clock> TaskService<'s, C> {
    pub fn new(store: &'s mut EntityStore, clock: C) -> Self {
        Self { store, clock }
    }

    /// Creates and stores a task.
    ///
    /// # Errors
    /// - `Validation` for a blank title or an out-of-range priority.
    pub fn create(&mut self, input: NewTask) -> ServiceResult<Task> {
        let now = self.clock.now();
        let title = normalize_required_text(&input.title, ValidationError::EmptyTitle)
            .map_err(|err| self.reject("task_create", None, err.into()))?;
        let priority = match input.priority {
            Some(level) => Priority::new(level)
                .map_err(|err| self.reject("task_create", None, err.into()))?,
            None => Priority::default(),
        };

        let mut task = Task::new(title, now);
        task.notes = normalize_optional_text(input.notes);
        task.priority = priority;
        task.project_id = input.project_id;
        task.tag_ids = input.tag_ids;
        task.dedupe_tag_ids();
        task.due_at = input.due_at;
        task.set_status(input.status, now);
        task.validate()
            .map_err(|err| self.reject("task_create", Some(task.id), err.into()))?;

        self.store.add_task(task.clone());
        info!(
            "event=task_create module=service status=ok task_id={} task_status={} priority={}",
            task.id,
            task.status.as_str(),
            task.priority.value()
        );
        Ok(task)
    }

    /// Applies `patch` to an existing task and re-indexes it.
    ///
    /// # Errors
    /// - `TaskNotFound` when `id` is unknown; nothing is modified.
    /// - `Validation` when the patched task would be invalid.
    pub fn update(&mut self, id: TaskId, patch: TaskPatch) -> ServiceResult<Task> {
        let Some(mut task) = self.store.get_task(id).cloned() else {
            return Err(self.reject("task_update", Some(id), ServiceError::TaskNotFound(id)));
        };
        let now = self.clock.now();

        if let Some(title) = patch.title {
            task.title = normalize_required_text(&title, ValidationError::EmptyTitle)
                .map_err(|err| self.reject("task_update", Some(id), err.into()))?;
        }
        if let Some(notes) = patch.notes {
            task.notes = normalize_optional_text(notes);
        }
        if let Some(level) = patch.priority {
            task.priority = Priority::new(level)
                .map_err(|err| self.reject("task_update", Some(id), err.into()))?;
        }
        if let Some(project_id) = patch.project_id {
            task.project_id = project_id;
        }
        if let Some(tag_ids) = patch.tag_ids {
            task.tag_ids = tag_ids;
            task.dedupe_tag_ids();
        }
        if let Some(due_at) = patch.due_at {
            task.due_at = due_at;
        }
        if let Some(status) = patch.status {
            task.set_status(status, now);
        }
        task.updated_at = now;
        task.validate()
            .map_err(|err| self.reject("task_update", Some(id), err.into()))?;

        self.store.update_task(task.clone());
        info!(
            "event=task_update module=service status=ok task_id={} task_status={} priority={}",
            task.id,
            task.status.as_str(),
            task.priority.value()
        );
        Ok(task)
    }

    /// Shorthand for a status-only update.
    pub fn set_status(&mut self, id: TaskId, status: TaskStatus) -> ServiceResult<Task> {
        self.update(id, TaskPatch::status(status))
    }

    /// Removes a task and all of its index contributions.
    pub fn remove(&mut self, id: TaskId) -> ServiceResult<Task> {
        match self.store.remove_task(id) {
            Some(task) => {
                info!("event=task_remove module=service status=ok task_id={id}");
                Ok(task)
            }
            None => Err(self.reject("task_remove", Some(id), ServiceError::TaskNotFound(id))),
        }
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.store.get_task(id)
    }

    pub fn list(&self) -> Vec<&Task> {
        self.store.tasks().collect()
    }

    /// Runs a structured query as of the clock's current instant.
    pub fn search(&self, filter: &TaskFilter) -> Vec<TaskView> {
        search(&*self.store, filter, self.clock.now())
    }

    /// Parses `query` and runs it.
    pub fn search_text(&self, query: &str) -> Vec<TaskView> {
        let now = self.clock.now();
        let filter = parse_query(query, &*self.store, now);
        search(&*self.store, &filter, now)
    }

    fn reject(&self, event: &str, id: Option<TaskId>, err: ServiceError) -> ServiceError {
        let id = id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
        warn!(
            "event={event} module=service status=error task_id={id} error_code={}",
            err.code()
        );
        err
    }
}

#[cfg(test)]
mod tests {
    use super::{NewTask, TaskPatch, TaskService};
    use crate::clock::{Clock, FixedClock};
    use crate::model::{TaskStatus, ValidationError};
    use crate::service::ServiceError;
    use crate::store::EntityStore;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn clock() -> FixedClock {
        let start = Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).single();
        FixedClock::new(start.expect("valid timestamp"))
    }

    #[test]
    fn create_trims_title_and_dedupes_tags() {
        let mut store = EntityStore::new();
        let clock = clock();
        let mut service = TaskService::new(&mut store, &clock);
        let tag = Uuid::new_v4();

        let mut input = NewTask::new("  plan trip  ");
        input.tag_ids = vec![tag, tag];
        input.notes = Some("   ".to_string());
        let task = service.create(input).expect("create should succeed");

        assert_eq!(task.title, "plan trip");
        assert_eq!(task.tag_ids, vec![tag]);
        assert_eq!(task.notes, None);
        assert_eq!(task.created_at, clock.now());
    }

    #[test]
    fn create_rejects_invalid_priority_without_storing() {
        let mut store = EntityStore::new();
        let clock = clock();
        let mut service = TaskService::new(&mut store, &clock);

        let mut input = NewTask::new("bad");
        input.priority = Some(7);
        let err = service.create(input).expect_err("create should be rejected");
        assert_eq!(err, ServiceError::Validation(ValidationError::InvalidPriority(7)));
        assert!(service.list().is_empty());
    }

    #[test]
    fn update_unknown_task_is_not_found_and_touches_nothing() {
        let mut store = EntityStore::new();
        let clock = clock();
        let mut service = TaskService::new(&mut store, &clock);
        service.create(NewTask::new("keep")).expect("create should succeed");

        let missing = Uuid::new_v4();
        let err = service.update(missing, TaskPatch::status(TaskStatus::Done))
            .expect_err("update should be rejected");
        assert_eq!(err, ServiceError::TaskNotFound(missing));
        assert!(service.remove(missing).expect_err("remove should be rejected").is_not_found());
        drop(service);
        assert_eq!(store.index().bucket_count_for(missing), 0);
        assert_eq!(store.task_count(), 1);
    }

    #[test]
    fn status_transitions_track_completed_at_and_updated_at() {
        let mut store = EntityStore::new();
        let clock = clock();
        let mut service = TaskService::new(&mut store, &clock);
        let task = service.create(NewTask::new("ship")).expect("create should succeed");

        clock.advance(Duration::minutes(5));
        let done = service.set_status(task.id, TaskStatus::Done)
            .expect("status change should succeed");
        assert_eq!(done.completed_at, Some(clock.now()));
        assert_eq!(done.updated_at, clock.now());

        clock.advance(Duration::minutes(5));
        let reopened = service.set_status(task.id, TaskStatus::Todo)
            .expect("status change should succeed");
        assert_eq!(reopened.completed_at, None);
    }
}
