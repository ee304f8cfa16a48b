//! SQLite-backed snapshot store.
//!
//! # Responsibility
//! - Map `Snapshot` collections to the `projects`, `tags`, `tasks` and
//!   `task_tags` tables.
//!
//! # Invariants
//! - `save` rewrites every table inside one IMMEDIATE transaction.
//! - Timestamps are stored as Unix epoch milliseconds (UTC).
//! - Task tag order is preserved through `task_tags.position`.

use super::{PersistError, PersistResult, SnapshotStore};
use crate::db::{open_db, open_db_in_memory};
use crate::model::{Priority, Project, Snapshot, Tag, Task, TaskId, TaskStatus};
use chrono::{DateTime, Utc};
use log::{error, info};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    notes,
    status,
    priority,
    project_id,
    created_at,
    updated_at,
    due_at,
    completed_at
FROM tasks
ORDER BY id ASC;";

pub struct SqliteSnapshotStore {
    conn: Connection,
}

impl SqliteSnapshotStore {
    /// Wraps an already-migrated connection (see `db::open_db`).
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn open_in_memory() -> PersistResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn load_projects(&self) -> PersistResult<Vec<Project>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, sort_order, parent_id FROM projects ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            let project = Project {
                id: parse_uuid(&row.get::<_, String>("id")?, "projects.id")?,
                name: row.get("name")?,
                order: row.get("sort_order")?,
                parent_id: parse_optional_uuid(row.get("parent_id")?, "projects.parent_id")?,
            };
            project.validate()?;
            projects.push(project);
        }
        Ok(projects)
    }

    fn load_tags(&self) -> PersistResult<Vec<Tag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, color FROM tags ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            let tag = Tag {
                id: parse_uuid(&row.get::<_, String>("id")?, "tags.id")?,
                name: row.get("name")?,
                color: row.get("color")?,
            };
            tag.validate()?;
            tags.push(tag);
        }
        Ok(tags)
    }

    fn load_task_tags(&self) -> PersistResult<HashMap<TaskId, Vec<Uuid>>> {
        let mut stmt = self.conn.prepare(
            "SELECT task_id, tag_id
             FROM task_tags
             ORDER BY task_id ASC, position ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut links: HashMap<TaskId, Vec<Uuid>> = HashMap::new();
        while let Some(row) = rows.next()? {
            let task_id = parse_uuid(&row.get::<_, String>("task_id")?, "task_tags.task_id")?;
            let tag_id = parse_uuid(&row.get::<_, String>("tag_id")?, "task_tags.tag_id")?;
            links.entry(task_id).or_default().push(tag_id);
        }
        Ok(links)
    }

    fn load_tasks(&self) -> PersistResult<Vec<Task>> {
        let mut links = self.load_task_tags()?;
        let mut stmt = self.conn.prepare(TASK_SELECT_SQL)?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            let mut task = parse_task_row(row)?;
            task.tag_ids = links.remove(&task.id).unwrap_or_default();
            task.validate()?;
            tasks.push(task);
        }
        Ok(tasks)
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn load(&self) -> PersistResult<Snapshot> {
        let started_at = Instant::now();
        let result = self.load_projects().and_then(|projects| {
            Ok(Snapshot {
                tags: self.load_tags()?,
                tasks: self.load_tasks()?,
                projects,
            })
        });

        match &result {
            Ok(snapshot) => info!(
                "event=snapshot_load module=persist status=ok tasks={} projects={} tags={} duration_ms={}",
                snapshot.tasks.len(),
                snapshot.projects.len(),
                snapshot.tags.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=snapshot_load module=persist status=error duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            ),
        }
        result
    }

    fn save(&mut self, snapshot: &Snapshot) -> PersistResult<()> {
        let started_at = Instant::now();
        let result = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(PersistError::from)
            .and_then(|tx| {
                write_snapshot(&tx, snapshot)?;
                tx.commit()?;
                Ok(())
            });

        match &result {
            Ok(()) => info!(
                "event=snapshot_save module=persist status=ok tasks={} projects={} tags={} duration_ms={}",
                snapshot.tasks.len(),
                snapshot.projects.len(),
                snapshot.tags.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=snapshot_save module=persist status=error duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            ),
        }
        result
    }
}

fn write_snapshot(tx: &Transaction<'_>, snapshot: &Snapshot) -> PersistResult<()> {
    tx.execute_batch(
        "DELETE FROM task_tags;
         DELETE FROM tasks;
         DELETE FROM tags;
         DELETE FROM projects;",
    )?;

    {
        let mut insert = tx.prepare(
            "INSERT INTO projects (id, name, sort_order, parent_id) VALUES (?1, ?2, ?3, ?4);",
        )?;
        for project in &snapshot.projects {
            project.validate()?;
            insert.execute(params![
                project.id.to_string(),
                project.name,
                project.order,
                project.parent_id.map(|id| id.to_string()),
            ])?;
        }
    }

    {
        let mut insert = tx.prepare("INSERT INTO tags (id, name, color) VALUES (?1, ?2, ?3);")?;
        for tag in &snapshot.tags {
            tag.validate()?;
            insert.execute(params![tag.id.to_string(), tag.name, tag.color])?;
        }
    }

    let mut insert_task = tx.prepare(
        "INSERT INTO tasks (
            id, title, notes, status, priority, project_id,
            created_at, updated_at, due_at, completed_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
    )?;
    let mut insert_link =
        tx.prepare("INSERT INTO task_tags (task_id, tag_id, position) VALUES (?1, ?2, ?3);")?;
    for task in &snapshot.tasks {
        task.validate()?;
        let task_id = task.id.to_string();
        insert_task.execute(params![
            task_id,
            task.title,
            task.notes,
            task.status.as_str(),
            task.priority.value(),
            task.project_id.map(|id| id.to_string()),
            task.created_at.timestamp_millis(),
            task.updated_at.timestamp_millis(),
            task.due_at.map(|at| at.timestamp_millis()),
            task.completed_at.map(|at| at.timestamp_millis()),
        ])?;
        for (position, tag_id) in task.tag_ids.iter().enumerate() {
            insert_link.execute(params![task_id, tag_id.to_string(), position as i64])?;
        }
    }

    Ok(())
}

fn parse_task_row(row: &Row<'_>) -> PersistResult<Task> {
    let status_text: String = row.get("status")?;
    let status = TaskStatus::parse(&status_text).ok_or_else(|| {
        PersistError::InvalidData(format!("invalid task status `{status_text}` in tasks.status"))
    })?;

    let priority_value: i64 = row.get("priority")?;
    let priority = u8::try_from(priority_value)
        .ok()
        .and_then(|value| Priority::new(value).ok())
        .ok_or_else(|| {
            PersistError::InvalidData(format!(
                "invalid priority `{priority_value}` in tasks.priority"
            ))
        })?;

    Ok(Task {
        id: parse_uuid(&row.get::<_, String>("id")?, "tasks.id")?,
        title: row.get("title")?,
        notes: row.get("notes")?,
        status,
        priority,
        project_id: parse_optional_uuid(row.get("project_id")?, "tasks.project_id")?,
        tag_ids: Vec::new(),
        created_at: parse_millis(row.get("created_at")?, "tasks.created_at")?,
        updated_at: parse_millis(row.get("updated_at")?, "tasks.updated_at")?,
        due_at: parse_optional_millis(row.get("due_at")?, "tasks.due_at")?,
        completed_at: parse_optional_millis(row.get("completed_at")?, "tasks.completed_at")?,
    })
}

fn parse_uuid(value: &str, column: &'static str) -> PersistResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| PersistError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn parse_optional_uuid(value: Option<String>, column: &'static str) -> PersistResult<Option<Uuid>> {
    value.map(|text| parse_uuid(&text, column)).transpose()
}

fn parse_millis(value: i64, column: &'static str) -> PersistResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(value).ok_or_else(|| {
        PersistError::InvalidData(format!("timestamp `{value}` out of range in {column}"))
    })
}

fn parse_optional_millis(
    value: Option<i64>,
    column: &'static str,
) -> PersistResult<Option<DateTime<Utc>>> {
    value.map(|millis| parse_millis(millis, column)).transpose()
}

#[cfg(test)]
mod tests {
    use super::SqliteSnapshotStore;
    use crate::persist::{PersistError, SnapshotStore};

    #[test]
    fn empty_database_loads_empty_snapshot() {
        let store = SqliteSnapshotStore::open_in_memory().expect("in-memory store should open");
        assert!(store.load().expect("load should succeed").is_empty());
    }

    #[test]
    fn corrupt_status_is_reported_as_invalid_data() {
        let store = SqliteSnapshotStore::open_in_memory().expect("in-memory store should open");
        // Disable CHECK constraints to simulate a file written by a buggy build.
        store
            .connection()
            .execute_batch(
                "PRAGMA ignore_check_constraints = ON;
                 INSERT INTO tasks (id, title, status, priority, created_at, updated_at)
                 VALUES ('7b0c4a56-7a2f-4a43-9a55-2b0f8a1c1d10', 'x', 'someday', 3, 0, 0);",
            )
            .expect("raw insert should run");

        match store.load().expect_err("load should fail") {
            PersistError::InvalidData(message) => assert!(message.contains("tasks.status")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
