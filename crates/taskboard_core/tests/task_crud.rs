use chrono::{Duration, TimeZone, Utc};
use rusqlite::Connection;
use std::collections::HashSet;
use taskboard_core::db::migrations::latest_version;
use taskboard_core::db::open_db_in_memory;
use taskboard_core::model::task::now_millis;
use taskboard_core::{
    NewTask, Priority, RepoError, SqliteTaskRepository, Task, TaskListQuery, TaskRepository,
};
use uuid::Uuid;

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let mut input = NewTask::new("Buy milk");
    input.description = Some("two litres".to_string());
    input.priority = Priority::High;
    input.due_date = Some(Utc.with_ymd_and_hms(2026, 11, 1, 0, 0, 0).unwrap());
    let task = Task::from_new(input, now_millis());
    let id = repo.create_task(&task).unwrap();

    let loaded = repo.get_task(id).unwrap().unwrap();
    assert_eq!(loaded, task);
    assert_eq!(loaded.description.as_deref(), Some("two litres"));
    assert_eq!(loaded.priority, Priority::High);
    assert!(!loaded.completed);
}

#[test]
fn created_ids_are_unique() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let mut ids = HashSet::new();
    for idx in 0..20 {
        let task = Task::from_new(NewTask::new(format!("task {idx}")), now_millis());
        ids.insert(repo.create_task(&task).unwrap());
    }

    assert_eq!(ids.len(), 20);
    let listed = repo.list_tasks(&TaskListQuery::default()).unwrap();
    assert_eq!(listed.len(), 20);
}

#[test]
fn update_existing_task() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let mut task = Task::from_new(NewTask::new("draft"), now_millis());
    repo.create_task(&task).unwrap();

    task.title = "final".to_string();
    task.completed = true;
    task.description = None;
    task.updated_at = task.updated_at + Duration::milliseconds(5);
    repo.update_task(&task).unwrap();

    let loaded = repo.get_task(task.id).unwrap().unwrap();
    assert_eq!(loaded.title, "final");
    assert!(loaded.completed);
    assert_eq!(loaded.updated_at, task.updated_at);
    assert_eq!(loaded.created_at, task.created_at);
}

#[test]
fn update_not_found_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let task = Task::from_new(NewTask::new("ghost"), now_millis());
    let err = repo.update_task(&task).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == task.id));
}

#[test]
fn get_unknown_id_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    assert!(repo.get_task(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn delete_removes_row_and_second_delete_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let task = Task::from_new(NewTask::new("short lived"), now_millis());
    repo.create_task(&task).unwrap();

    repo.delete_task(task.id).unwrap();
    assert!(repo.get_task(task.id).unwrap().is_none());

    let err = repo.delete_task(task.id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
}

#[test]
fn create_rejects_blank_title_before_sql() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let task = Task::from_new(NewTask::new("   "), now_millis());
    let err = repo.create_task(&task).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert!(repo.list_tasks(&TaskListQuery::default()).unwrap().is_empty());
}

#[test]
fn read_rejects_invalid_persisted_priority() {
    let conn = open_db_in_memory().unwrap();
    let id = Uuid::new_v4();
    conn.execute_batch("PRAGMA ignore_check_constraints = ON;")
        .unwrap();
    conn.execute(
        "INSERT INTO tasks (id, title, priority, created_at, updated_at)
         VALUES (?1, 'tampered', 'urgent', 1, 1);",
        [id.to_string()],
    )
    .unwrap();

    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let err = repo.get_task(id).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn try_new_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteTaskRepository::try_new(&conn)
        .err()
        .expect("unmigrated connection must be rejected");
    match err {
        RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        } => {
            assert_eq!(expected_version, latest_version());
            assert_eq!(actual_version, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn try_new_rejects_schema_without_required_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!(
        "CREATE TABLE tasks (id TEXT PRIMARY KEY, title TEXT NOT NULL);
         PRAGMA user_version = {};",
        latest_version()
    ))
    .unwrap();

    let err = SqliteTaskRepository::try_new(&conn)
        .err()
        .expect("drifted schema must be rejected");
    assert!(matches!(
        err,
        RepoError::MissingRequiredColumn {
            table: "tasks",
            column: "description"
        }
    ));
}
