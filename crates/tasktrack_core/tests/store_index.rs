use chrono::{TimeZone, Utc};
use tasktrack_core::{
    EntityStore, FixedClock, NewTag, NewTask, Priority, TagService, TaskPatch, TaskService,
    TaskStatus,
};

fn clock() -> FixedClock {
    FixedClock::new(Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap())
}

fn assert_index_consistent(store: &EntityStore) {
    let index = store.index();
    for task in store.tasks() {
        for status in TaskStatus::ALL {
            let present = index
                .status_bucket(status)
                .is_some_and(|bucket| bucket.contains(&task.id));
            assert_eq!(present, status == task.status, "status bucket {status:?}");
        }
        for priority in Priority::all() {
            let present = index
                .priority_bucket(priority)
                .is_some_and(|bucket| bucket.contains(&task.id));
            assert_eq!(present, priority == task.priority, "priority bucket {priority:?}");
        }
        for tag_id in &task.tag_ids {
            assert!(index.tag_bucket(*tag_id).unwrap().contains(&task.id));
        }
    }
}

#[test]
fn indexes_track_every_mutation() {
    let mut store = EntityStore::new();
    let clock = clock();
    let urgent = TagService::new(&mut store)
        .create(NewTag::new("urgent"))
        .unwrap();

    let mut tasks = TaskService::new(&mut store, &clock);
    let mut input = NewTask::new("renew passport");
    input.priority = Some(2);
    input.tag_ids = vec![urgent.id];
    let passport = tasks.create(input).unwrap();
    let groceries = tasks.create(NewTask::new("groceries")).unwrap();

    tasks
        .update(
            passport.id,
            TaskPatch {
                status: Some(TaskStatus::Doing),
                priority: Some(1),
                tag_ids: Some(Vec::new()),
                ..TaskPatch::default()
            },
        )
        .unwrap();
    tasks.set_status(groceries.id, TaskStatus::Done).unwrap();
    drop(tasks);

    assert_index_consistent(&store);
    assert!(store.index().tag_bucket(urgent.id).is_none());
    assert_eq!(
        store.index().statuses_present(),
        vec![TaskStatus::Doing, TaskStatus::Done]
    );
}

#[test]
fn removed_task_leaves_no_bucket_entries() {
    let mut store = EntityStore::new();
    let clock = clock();
    let project = tasktrack_core::ProjectService::new(&mut store)
        .create(tasktrack_core::NewProject::new("Home"))
        .unwrap();
    let tag = TagService::new(&mut store).create(NewTag::new("chores")).unwrap();

    let mut tasks = TaskService::new(&mut store, &clock);
    let mut input = NewTask::new("mow lawn");
    input.project_id = Some(project.id);
    input.tag_ids = vec![tag.id];
    let task = tasks.create(input).unwrap();
    tasks.remove(task.id).unwrap();
    drop(tasks);

    assert_eq!(store.index().bucket_count_for(task.id), 0);
    assert!(store.index().is_empty());
}

#[test]
fn added_task_reads_back_equal() {
    let mut store = EntityStore::new();
    let now = Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap();
    let mut task = tasktrack_core::Task::new("call plumber", now);
    task.notes = Some("kitchen sink".to_string());
    task.priority = Priority::HIGHEST;
    task.due_at = Some(Utc.with_ymd_and_hms(2026, 3, 20, 17, 0, 0).unwrap());

    store.add_task(task.clone());
    assert_eq!(store.get_task(task.id), Some(&task));
}

#[test]
fn tag_name_lookup_follows_rename_and_remove() {
    let mut store = EntityStore::new();
    let mut tags = TagService::new(&mut store);
    let tag = tags.create(NewTag::new("Errand")).unwrap();
    tags.update(
        tag.id,
        tasktrack_core::TagPatch {
            name: Some("Errands".to_string()),
            color: None,
        },
    )
    .unwrap();

    assert!(tags.find_by_name("errand").is_none());
    assert_eq!(tags.find_by_name("ERRANDS").map(|t| t.id), Some(tag.id));

    tags.remove(tag.id).unwrap();
    assert!(tags.find_by_name("errands").is_none());
    // The name is free again.
    tags.create(NewTag::new("errands")).unwrap();
}
