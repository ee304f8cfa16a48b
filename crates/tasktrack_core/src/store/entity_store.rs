//! In-memory entity store with maintained task indexes.
//!
//! # Responsibility
//! - Own canonical task/project/tag records keyed by id.
//! - Keep `TaskIndex` and the tag-name map in step with every mutation.
//! - Convert to and from whole-store snapshots.
//!
//! # Invariants
//! - Every task in `tasks` is indexed under its current field values, and
//!   nothing else is indexed.
//! - `tag_names` maps each tag's normalized name to its id; the map changes
//!   in the same call as the tag record.
//! - Stored tasks never repeat a tag id.
//! - Removing an unknown id is a no-op; callers that need NotFound
//!   semantics check existence first.
//!
//! # See also
//! - crate::service for validated create/update/remove entry points.

use super::index::TaskIndex;
use crate::model::{
    normalize_tag_name, Project, ProjectId, Snapshot, Tag, TagId, Task, TaskId,
};
use chrono::{DateTime, Utc};
use log::debug;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    tasks: BTreeMap<TaskId, Task>,
    projects: BTreeMap<ProjectId, Project>,
    tags: BTreeMap<TagId, Tag>,
    tag_names: HashMap<String, TagId>,
    index: TaskIndex,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a snapshot, indexing every task.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut store = Self::new();
        store.replace_with_snapshot(snapshot);
        store
    }

    /// Discards all state and rebuilds from `snapshot`.
    pub fn replace_with_snapshot(&mut self, snapshot: Snapshot) {
        self.tasks.clear();
        self.projects.clear();
        self.tags.clear();
        self.tag_names.clear();
        self.index.clear();

        for project in snapshot.projects {
            self.upsert_project(project);
        }
        for tag in snapshot.tags {
            self.upsert_tag(tag);
        }
        for task in snapshot.tasks {
            self.upsert_task(task);
        }

        debug!(
            "event=store_replace module=store status=ok tasks={} projects={} tags={}",
            self.tasks.len(),
            self.projects.len(),
            self.tags.len()
        );
    }

    /// Copies all collections, each ordered by id.
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            tasks: self.tasks.values().cloned().collect(),
            projects: self.projects.values().cloned().collect(),
            tags: self.tags.values().cloned().collect(),
        }
    }

    pub fn index(&self) -> &TaskIndex {
        &self.index
    }

    // ---- tasks ----

    /// Inserts a new task. An existing task with the same id is replaced.
    pub fn add_task(&mut self, task: Task) {
        self.upsert_task(task);
    }

    pub fn get_task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn contains_task(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    /// Replaces the stored task with the same id and re-derives its index
    /// contributions. Acts as a pure insert when the id is unknown.
    ///
    /// Returns the prior value.
    pub fn update_task(&mut self, task: Task) -> Option<Task> {
        self.upsert_task(task)
    }

    /// Removes a task and purges its index contributions.
    pub fn remove_task(&mut self, id: TaskId) -> Option<Task> {
        let removed = self.tasks.remove(&id)?;
        self.index.remove(&removed);
        Some(removed)
    }

    /// All tasks in ascending id order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// All task ids in ascending order.
    pub fn task_ids(&self) -> BTreeSet<TaskId> {
        self.tasks.keys().copied().collect()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Ids of tasks overdue at `now`, derived from current state.
    pub fn overdue_task_ids(&self, now: DateTime<Utc>) -> BTreeSet<TaskId> {
        self.tasks
            .values()
            .filter(|task| task.is_overdue_at(now))
            .map(|task| task.id)
            .collect()
    }

    fn upsert_task(&mut self, mut task: Task) -> Option<Task> {
        task.dedupe_tag_ids();
        let previous = self.tasks.remove(&task.id);
        if let Some(previous) = previous.as_ref() {
            self.index.remove(previous);
        }
        self.index.insert(&task);
        self.tasks.insert(task.id, task);
        previous
    }

    // ---- projects ----

    pub fn add_project(&mut self, project: Project) {
        self.upsert_project(project);
    }

    pub fn get_project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.get(&id)
    }

    pub fn contains_project(&self, id: ProjectId) -> bool {
        self.projects.contains_key(&id)
    }

    pub fn update_project(&mut self, project: Project) -> Option<Project> {
        self.upsert_project(project)
    }

    /// Removes a project. Tasks and child projects keep their dangling references.
    pub fn remove_project(&mut self, id: ProjectId) -> Option<Project> {
        self.projects.remove(&id)
    }

    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    /// Direct children of `parent_id` (`None` = roots), ordered by `(order, name, id)`.
    pub fn children_of(&self, parent_id: Option<ProjectId>) -> Vec<&Project> {
        let mut children = self
            .projects
            .values()
            .filter(|project| project.parent_id == parent_id)
            .collect::<Vec<_>>();
        children.sort_by(|left, right| {
            left.order
                .cmp(&right.order)
                .then_with(|| left.name.to_lowercase().cmp(&right.name.to_lowercase()))
                .then_with(|| left.id.cmp(&right.id))
        });
        children
    }

    /// First project whose name matches case-insensitively, in id order.
    pub fn find_project_by_name(&self, name: &str) -> Option<&Project> {
        let wanted = name.trim().to_lowercase();
        self.projects
            .values()
            .find(|project| project.name.trim().to_lowercase() == wanted)
    }

    fn upsert_project(&mut self, project: Project) -> Option<Project> {
        self.projects.insert(project.id, project)
    }

    // ---- tags ----

    pub fn add_tag(&mut self, tag: Tag) {
        self.upsert_tag(tag);
    }

    pub fn get_tag(&self, id: TagId) -> Option<&Tag> {
        self.tags.get(&id)
    }

    /// Replaces a tag; a rename moves its normalized-name entry in the same call.
    pub fn update_tag(&mut self, tag: Tag) -> Option<Tag> {
        self.upsert_tag(tag)
    }

    /// Removes a tag and its name entry. Tasks keep their dangling tag ids.
    pub fn remove_tag(&mut self, id: TagId) -> Option<Tag> {
        let removed = self.tags.remove(&id)?;
        self.release_tag_name(&removed);
        Some(removed)
    }

    /// Case-insensitive lookup by name.
    pub fn find_tag_by_name(&self, name: &str) -> Option<&Tag> {
        self.tag_names
            .get(&normalize_tag_name(name))
            .and_then(|id| self.tags.get(id))
    }

    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.tags.values()
    }

    fn upsert_tag(&mut self, tag: Tag) -> Option<Tag> {
        let previous = self.tags.remove(&tag.id);
        if let Some(previous) = previous.as_ref() {
            self.release_tag_name(previous);
        }
        self.tag_names.insert(tag.normalized_name(), tag.id);
        self.tags.insert(tag.id, tag);
        previous
    }

    fn release_tag_name(&mut self, tag: &Tag) {
        let key = tag.normalized_name();
        if self.tag_names.get(&key) == Some(&tag.id) {
            self.tag_names.remove(&key);
        }
    }

    #[cfg(test)]
    pub(crate) fn tag_name_keys(&self) -> Vec<String> {
        let mut keys = self.tag_names.keys().cloned().collect::<Vec<_>>();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::EntityStore;
    use crate::model::{Priority, Snapshot, Tag, Task, TaskStatus};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn update_moves_task_between_buckets() {
        let now = Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).single().expect("valid timestamp");
        let mut store = EntityStore::new();
        let task = Task::new("draft", now);
        store.add_task(task.clone());

        let mut changed = task.clone();
        changed.set_status(TaskStatus::Doing, now);
        changed.priority = Priority::HIGHEST;
        let previous = store.update_task(changed).expect("task should already be stored");
        assert_eq!(previous, task);

        let index = store.index();
        assert!(index.status_bucket(TaskStatus::Todo).is_none());
        assert!(
            index
                .status_bucket(TaskStatus::Doing)
                .expect("status bucket should exist")
                .contains(&task.id)
        );
        assert!(index.priority_bucket(Priority::NORMAL).is_none());
        assert_eq!(index.bucket_count_for(task.id), 2);
    }

    #[test]
    fn add_task_drops_repeated_tag_ids() {
        let now = Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).single().expect("valid timestamp");
        let home = Tag::new("home");
        let errands = Tag::new("errands");
        let mut task = Task::new("groceries", now);
        task.tag_ids = vec![home.id, errands.id, home.id];

        let mut store = EntityStore::new();
        store.add_task(task.clone());

        let stored = store.get_task(task.id).expect("task should be stored");
        assert_eq!(stored.tag_ids, vec![home.id, errands.id]);
        stored.validate().expect("stored task should validate");
        assert_eq!(store.index().bucket_count_for(task.id), 4);
    }

    #[test]
    fn update_of_unknown_task_is_insert() {
        let mut store = EntityStore::new();
        let task = Task::new("fresh", Utc::now());
        assert!(store.update_task(task.clone()).is_none());
        assert_eq!(store.get_task(task.id), Some(&task));
    }

    #[test]
    fn tag_rename_keeps_name_map_in_sync() {
        let mut store = EntityStore::new();
        let tag = Tag::new("Urgent");
        store.add_tag(tag.clone());
        assert_eq!(store.find_tag_by_name("URGENT").map(|t| t.id), Some(tag.id));

        let mut renamed = tag.clone();
        renamed.name = "Critical".to_string();
        store.update_tag(renamed);
        assert!(store.find_tag_by_name("urgent").is_none());
        assert_eq!(store.find_tag_by_name("critical").map(|t| t.id), Some(tag.id));
        assert_eq!(store.tag_name_keys(), vec!["critical".to_string()]);

        store.remove_tag(tag.id);
        assert!(store.tag_name_keys().is_empty());
    }

    #[test]
    fn overdue_ids_are_derived_from_the_given_instant() {
        let now = Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).single().expect("valid timestamp");
        let mut store = EntityStore::new();
        let mut task = Task::new("file taxes", now);
        task.due_at = Some(now + Duration::hours(1));
        store.add_task(task.clone());

        assert!(store.overdue_task_ids(now).is_empty());
        assert!(store
            .overdue_task_ids(now + Duration::hours(2))
            .contains(&task.id));
    }

    #[test]
    fn snapshot_round_trip_rebuilds_indexes() {
        let now = Utc::now();
        let mut store = EntityStore::new();
        let tag = Tag::new("home");
        let mut task = Task::new("water plants", now);
        task.tag_ids.push(tag.id);
        store.add_tag(tag.clone());
        store.add_task(task.clone());

        let rebuilt = EntityStore::from_snapshot(store.to_snapshot());
        assert_eq!(rebuilt.get_task(task.id), Some(&task));
        assert!(
            rebuilt
                .index()
                .tag_bucket(tag.id)
                .expect("tag bucket should exist")
                .contains(&task.id)
        );
        assert!(rebuilt.find_tag_by_name("HOME").is_some());

        let mut emptied = rebuilt;
        emptied.replace_with_snapshot(Snapshot::default());
        assert_eq!(emptied.task_count(), 0);
        assert!(emptied.index().is_empty());
    }
}
