//! Secondary task indexes.
//!
//! # Responsibility
//! - Map project / tag / status / priority keys to sets of task ids.
//! - Provide exact insert/remove inverses driven by a task value.
//!
//! # Invariants
//! - Buckets exist only while non-empty.
//! - A task id sits in exactly one status bucket and one priority bucket,
//!   zero or one project bucket, and one bucket per distinct tag.
//! - Indexes hold ids only; the entity store owns the records.

use crate::model::{Priority, ProjectId, TagId, Task, TaskId, TaskStatus};
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

/// Ordered set of task ids sharing one index key.
pub type Bucket = BTreeSet<TaskId>;

#[derive(Debug, Clone, Default)]
pub struct TaskIndex {
    by_project: HashMap<ProjectId, Bucket>,
    by_tag: HashMap<TagId, Bucket>,
    by_status: HashMap<TaskStatus, Bucket>,
    by_priority: HashMap<Priority, Bucket>,
}

impl TaskIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `task.id` to every bucket implied by the task's current fields.
    pub fn insert(&mut self, task: &Task) {
        add_to_bucket(&mut self.by_status, task.status, task.id);
        add_to_bucket(&mut self.by_priority, task.priority, task.id);
        if let Some(project_id) = task.project_id {
            add_to_bucket(&mut self.by_project, project_id, task.id);
        }
        for tag_id in &task.tag_ids {
            add_to_bucket(&mut self.by_tag, *tag_id, task.id);
        }
    }

    /// Exact inverse of [`TaskIndex::insert`] for the same task value.
    ///
    /// Removing contributions that were never inserted is a no-op.
    pub fn remove(&mut self, task: &Task) {
        remove_from_bucket(&mut self.by_status, task.status, task.id);
        remove_from_bucket(&mut self.by_priority, task.priority, task.id);
        if let Some(project_id) = task.project_id {
            remove_from_bucket(&mut self.by_project, project_id, task.id);
        }
        for tag_id in &task.tag_ids {
            remove_from_bucket(&mut self.by_tag, *tag_id, task.id);
        }
    }

    pub fn clear(&mut self) {
        self.by_project.clear();
        self.by_tag.clear();
        self.by_status.clear();
        self.by_priority.clear();
    }

    pub fn status_bucket(&self, status: TaskStatus) -> Option<&Bucket> {
        self.by_status.get(&status)
    }

    pub fn priority_bucket(&self, priority: Priority) -> Option<&Bucket> {
        self.by_priority.get(&priority)
    }

    pub fn tag_bucket(&self, tag_id: TagId) -> Option<&Bucket> {
        self.by_tag.get(&tag_id)
    }

    pub fn project_bucket(&self, project_id: ProjectId) -> Option<&Bucket> {
        self.by_project.get(&project_id)
    }

    /// Union of the status buckets for `statuses`.
    pub fn union_statuses<'a>(&self, statuses: impl IntoIterator<Item = &'a TaskStatus>) -> Bucket {
        union_buckets(&self.by_status, statuses)
    }

    /// Union of the priority buckets for `priorities`.
    pub fn union_priorities<'a>(
        &self,
        priorities: impl IntoIterator<Item = &'a Priority>,
    ) -> Bucket {
        union_buckets(&self.by_priority, priorities)
    }

    /// Union of the tag buckets for `tag_ids`.
    pub fn union_tags<'a>(&self, tag_ids: impl IntoIterator<Item = &'a TagId>) -> Bucket {
        union_buckets(&self.by_tag, tag_ids)
    }

    /// Number of buckets holding `task_id`, across all categories.
    pub fn bucket_count_for(&self, task_id: TaskId) -> usize {
        count_holding(&self.by_project, task_id)
            + count_holding(&self.by_tag, task_id)
            + count_holding(&self.by_status, task_id)
            + count_holding(&self.by_priority, task_id)
    }

    /// Status keys that currently own a bucket.
    pub fn statuses_present(&self) -> Vec<TaskStatus> {
        let mut keys = self.by_status.keys().copied().collect::<Vec<_>>();
        keys.sort();
        keys
    }

    pub fn is_empty(&self) -> bool {
        self.by_project.is_empty()
            && self.by_tag.is_empty()
            && self.by_status.is_empty()
            && self.by_priority.is_empty()
    }
}

fn add_to_bucket<K: Eq + Hash>(buckets: &mut HashMap<K, Bucket>, key: K, task_id: TaskId) {
    buckets.entry(key).or_default().insert(task_id);
}

fn remove_from_bucket<K: Eq + Hash>(buckets: &mut HashMap<K, Bucket>, key: K, task_id: TaskId) {
    if let Entry::Occupied(mut bucket) = buckets.entry(key) {
        bucket.get_mut().remove(&task_id);
        if bucket.get().is_empty() {
            bucket.remove_entry();
        }
    }
}

fn union_buckets<'a, K: Eq + Hash + 'a>(
    buckets: &HashMap<K, Bucket>,
    keys: impl IntoIterator<Item = &'a K>,
) -> Bucket {
    let mut union = Bucket::new();
    for key in keys {
        if let Some(bucket) = buckets.get(key) {
            union.extend(bucket.iter().copied());
        }
    }
    union
}

fn count_holding<K>(buckets: &HashMap<K, Bucket>, task_id: TaskId) -> usize {
    buckets
        .values()
        .filter(|bucket| bucket.contains(&task_id))
        .count()
}
