//! Index-backed task query engine.
//!
//! # Responsibility
//! - Turn a `TaskFilter` into an ordered list of hydrated `TaskView`s.
//!
//! # Invariants
//! - Never fails; no matches yields an empty list.
//! - Dangling project/tag references are omitted from views, not reported.
//! - `is_overdue` and `days_until_due` are computed from the `now` passed in.
//! - Without a sort spec, results are in ascending task-id order.

use super::filter::{SortDirection, SortField, SortSpec, TaskFilter};
use crate::model::{Project, Tag, Task};
use crate::store::{Bucket, EntityStore};
use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;
use std::cmp::Ordering;
use std::time::Instant;

/// Task joined with its resolved project/tags and time-derived flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskView {
    pub task: Task,
    pub project: Option<Project>,
    pub tags: Vec<Tag>,
    pub is_overdue: bool,
    pub days_until_due: Option<i64>,
}

impl TaskView {
    /// Expands one task against the store at instant `now`.
    pub fn hydrate(store: &EntityStore, task: &Task, now: DateTime<Utc>) -> Self {
        let project = task
            .project_id
            .and_then(|project_id| store.get_project(project_id))
            .cloned();
        let tags = task
            .tag_ids
            .iter()
            .filter_map(|tag_id| store.get_tag(*tag_id))
            .cloned()
            .collect();

        Self {
            task: task.clone(),
            project,
            tags,
            is_overdue: task.is_overdue_at(now),
            days_until_due: task.days_until_due(now),
        }
    }
}

/// Runs `filter` against `store` as of `now`.
pub fn search(store: &EntityStore, filter: &TaskFilter, now: DateTime<Utc>) -> Vec<TaskView> {
    let started_at = Instant::now();
    let filter = filter.clone().normalized();

    let candidates = candidate_ids(store, &filter);
    let candidate_count = candidates.len();

    let text = filter.text.as_ref().map(|text| text.to_lowercase());
    let mut views = candidates
        .into_iter()
        .filter_map(|task_id| store.get_task(task_id))
        .filter(|task| match filter.due_before {
            Some(cutoff) => task.due_at.is_some_and(|due_at| due_at <= cutoff),
            None => true,
        })
        .filter(|task| match text.as_deref() {
            Some(needle) => mentions(task, needle),
            None => true,
        })
        .filter(|task| match filter.exclude_text.as_deref() {
            Some(terms) => !terms.iter().any(|term| mentions(task, term)),
            None => true,
        })
        .map(|task| TaskView::hydrate(store, task, now))
        .collect::<Vec<_>>();

    if let Some(sort) = filter.sort {
        sort_views(&mut views, sort);
    }
    if let Some(limit) = filter.limit {
        views.truncate(limit);
    }

    debug!(
        "event=task_search module=search status=ok candidates={} results={} sorted={} duration_ms={}",
        candidate_count,
        views.len(),
        filter.sort.is_some(),
        started_at.elapsed().as_millis()
    );
    views
}

/// Index phase: union buckets within each constrained category, intersect across.
fn candidate_ids(store: &EntityStore, filter: &TaskFilter) -> Bucket {
    if !filter.has_index_constraints() {
        return store.task_ids();
    }

    let index = store.index();
    let mut categories = Vec::with_capacity(4);
    if let Some(statuses) = filter.statuses.as_ref() {
        categories.push(index.union_statuses(statuses));
    }
    if let Some(priorities) = filter.priorities.as_ref() {
        categories.push(index.union_priorities(priorities));
    }
    if let Some(tags) = filter.tags.as_ref() {
        categories.push(index.union_tags(tags));
    }
    if let Some(project_id) = filter.project_id {
        categories.push(index.project_bucket(project_id).cloned().unwrap_or_default());
    }

    // Smallest first keeps the running intersection short.
    categories.sort_by_key(|bucket| bucket.len());
    let mut categories = categories.into_iter();
    let Some(mut result) = categories.next() else {
        return Bucket::new();
    };
    for bucket in categories {
        if result.is_empty() {
            break;
        }
        result.retain(|task_id| bucket.contains(task_id));
    }
    result
}

fn mentions(task: &Task, needle_lowercase: &str) -> bool {
    task.title.to_lowercase().contains(needle_lowercase)
        || task
            .notes
            .as_deref()
            .is_some_and(|notes| notes.to_lowercase().contains(needle_lowercase))
}

/// Stable sort; ties keep their prior relative order.
fn sort_views(views: &mut [TaskView], sort: SortSpec) {
    views.sort_by(|left, right| compare(&left.task, &right.task, sort));
}

fn compare(left: &Task, right: &Task, sort: SortSpec) -> Ordering {
    match sort.field {
        SortField::Title => directed(
            left.title.to_lowercase().cmp(&right.title.to_lowercase()),
            sort.direction,
        ),
        SortField::Priority => directed(
            left.priority.value().cmp(&right.priority.value()),
            sort.direction,
        ),
        SortField::CreatedAt => directed(left.created_at.cmp(&right.created_at), sort.direction),
        SortField::UpdatedAt => directed(left.updated_at.cmp(&right.updated_at), sort.direction),
        // Missing due dates sort last in both directions.
        SortField::DueAt => match (left.due_at, right.due_at) {
            (Some(left_due), Some(right_due)) => directed(left_due.cmp(&right_due), sort.direction),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}
