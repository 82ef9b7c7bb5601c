use chrono::{TimeZone, Utc};
use serde_json::json;
use taskboard_core::{NewTask, Priority, Task, TaskPatch};

#[test]
fn task_serializes_with_camel_case_wire_names() {
    let now = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
    let mut input = NewTask::new("Buy milk");
    input.due_date = Some(Utc.with_ymd_and_hms(2026, 1, 9, 0, 0, 0).unwrap());
    let task = Task::from_new(input, now);

    let value = serde_json::to_value(&task).unwrap();
    assert_eq!(value["id"], json!(task.id.to_string()));
    assert_eq!(value["title"], json!("Buy milk"));
    assert_eq!(value["description"], json!(null));
    assert_eq!(value["completed"], json!(false));
    assert_eq!(value["priority"], json!("medium"));
    assert_eq!(value["dueDate"], json!("2026-01-09T00:00:00Z"));
    assert_eq!(value["createdAt"], json!("2026-01-02T03:04:05Z"));
    assert_eq!(value["updatedAt"], json!("2026-01-02T03:04:05Z"));
}

#[test]
fn task_deserializes_from_wire_shape() {
    let task: Task = serde_json::from_value(json!({
        "id": "6f1c1f0e-8d1a-4a55-9b8e-2f4a8c1d9e10",
        "title": "Pay rent",
        "description": "before friday",
        "completed": true,
        "priority": "high",
        "dueDate": null,
        "createdAt": "2026-01-02T03:04:05.123Z",
        "updatedAt": "2026-01-02T03:04:06Z"
    }))
    .unwrap();

    assert_eq!(task.priority, Priority::High);
    assert!(task.completed);
    assert_eq!(task.due_date, None);
    assert_eq!(task.created_at.timestamp_subsec_millis(), 123);
}

#[test]
fn apply_patch_reports_whether_anything_changed() {
    let now = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
    let mut task = Task::from_new(NewTask::new("Same"), now);

    let same = TaskPatch {
        title: Some("Same".to_string()),
        completed: Some(false),
        description: Some(None),
        ..TaskPatch::default()
    };
    assert!(!task.apply_patch(same));

    let different = TaskPatch {
        priority: Some(Priority::Low),
        ..TaskPatch::default()
    };
    assert!(task.apply_patch(different));
    assert_eq!(task.priority, Priority::Low);
    assert_eq!(task.updated_at, now);
}

#[test]
fn validation_error_lists_every_issue() {
    let err = Task::from_new(NewTask::new(""), Utc::now())
        .validate()
        .unwrap_err();
    assert!(err.has_field("title"));
    assert_eq!(err.to_string(), "title must not be empty");
}
