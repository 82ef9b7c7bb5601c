//! Request and response bodies.
//!
//! Request structs mirror the wire loosely; conversion into core inputs
//! collects every rejected field into one `TaskValidationError`.

use serde::{Deserialize, Deserializer, Serialize};
use taskboard_core::{
    parse_due_date, FieldProblem, NewTask, Priority, TaskListQuery, TaskPatch,
    TaskValidationError,
};

const DUE_DATE_EXPECTED: &str = "an RFC 3339 timestamp or a YYYY-MM-DD date";

/// Body of `POST /tasks`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub completed: Option<Option<bool>>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
}

impl TryFrom<CreateTaskRequest> for NewTask {
    type Error = TaskValidationError;

    fn try_from(request: CreateTaskRequest) -> Result<Self, Self::Error> {
        let mut error = TaskValidationError::default();

        let title = match request.title {
            None => {
                error.push("title", FieldProblem::Missing);
                String::new()
            }
            Some(title) if title.trim().is_empty() => {
                error.push("title", FieldProblem::Blank);
                String::new()
            }
            Some(title) => title,
        };

        let completed = match request.completed {
            None => false,
            Some(None) => {
                error.push("completed", FieldProblem::NotNullable);
                false
            }
            Some(Some(completed)) => completed,
        };

        let priority = match non_empty(request.priority) {
            None => Priority::default(),
            Some(raw) => Priority::parse(&raw).unwrap_or_else(|| {
                error.push(
                    "priority",
                    FieldProblem::Invalid {
                        expected: Priority::EXPECTED,
                    },
                );
                Priority::default()
            }),
        };

        let due_date = match non_empty(request.due_date) {
            None => None,
            Some(raw) => parse_due_date(&raw).or_else(|| {
                error.push(
                    "dueDate",
                    FieldProblem::Invalid {
                        expected: DUE_DATE_EXPECTED,
                    },
                );
                None
            }),
        };

        error.into_result()?;
        Ok(NewTask {
            title,
            description: non_empty(request.description),
            completed,
            priority,
            due_date,
        })
    }
}

/// Body of `PUT /tasks/{id}`.
///
/// Outer `None` means the field was absent; `Some(None)` means explicit `null`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub completed: Option<Option<bool>>,
    #[serde(default, deserialize_with = "present")]
    pub priority: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub due_date: Option<Option<String>>,
}

impl TryFrom<UpdateTaskRequest> for TaskPatch {
    type Error = TaskValidationError;

    fn try_from(request: UpdateTaskRequest) -> Result<Self, Self::Error> {
        let mut error = TaskValidationError::default();
        let mut patch = TaskPatch {
            description: request.description,
            ..TaskPatch::default()
        };

        match request.title {
            None => {}
            Some(None) => error.push("title", FieldProblem::NotNullable),
            Some(Some(title)) if title.trim().is_empty() => {
                error.push("title", FieldProblem::Blank)
            }
            Some(Some(title)) => patch.title = Some(title),
        }

        match request.completed {
            None => {}
            Some(None) => error.push("completed", FieldProblem::NotNullable),
            Some(Some(completed)) => patch.completed = Some(completed),
        }

        match request.priority {
            None => {}
            Some(None) => error.push("priority", FieldProblem::NotNullable),
            Some(Some(raw)) => match Priority::parse(&raw) {
                Some(priority) => patch.priority = Some(priority),
                None => error.push(
                    "priority",
                    FieldProblem::Invalid {
                        expected: Priority::EXPECTED,
                    },
                ),
            },
        }

        match request.due_date.map(non_empty) {
            None => {}
            Some(None) => patch.due_date = Some(None),
            Some(Some(raw)) => match parse_due_date(&raw) {
                Some(due_date) => patch.due_date = Some(Some(due_date)),
                None => error.push(
                    "dueDate",
                    FieldProblem::Invalid {
                        expected: DUE_DATE_EXPECTED,
                    },
                ),
            },
        }

        error.into_result()?;
        Ok(patch)
    }
}

/// Query string of `GET /tasks`.
#[derive(Debug, Default, Deserialize)]
pub struct ListTasksParams {
    pub completed: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl From<ListTasksParams> for TaskListQuery {
    fn from(params: ListTasksParams) -> Self {
        TaskListQuery::from_params(
            params.completed.as_deref(),
            params.search.as_deref(),
            params.sort.as_deref(),
            params.order.as_deref(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

impl HealthResponse {
    pub fn up() -> Self {
        Self {
            status: "UP".to_string(),
            message: "API is running".to_string(),
        }
    }
}

/// Keeps an explicit `null` distinguishable from an absent field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{CreateTaskRequest, UpdateTaskRequest};
    use serde_json::json;
    use taskboard_core::{NewTask, Priority, TaskPatch};

    fn create(body: serde_json::Value) -> CreateTaskRequest {
        serde_json::from_value(body).expect("create body should deserialize")
    }

    fn update(body: serde_json::Value) -> UpdateTaskRequest {
        serde_json::from_value(body).expect("update body should deserialize")
    }

    #[test]
    fn create_applies_defaults_for_empty_optional_fields() {
        let input = NewTask::try_from(create(json!({
            "title": "Buy milk",
            "description": "",
            "priority": "",
            "dueDate": ""
        })))
        .expect("valid create body");

        assert_eq!(input.description, None);
        assert_eq!(input.priority, Priority::Medium);
        assert_eq!(input.due_date, None);
        assert!(!input.completed);
    }

    #[test]
    fn create_reports_every_invalid_field() {
        let err = NewTask::try_from(create(json!({
            "completed": null,
            "priority": "urgent",
            "dueDate": "someday"
        })))
        .expect_err("invalid create body");

        assert!(err.has_field("title"));
        assert!(err.has_field("completed"));
        assert!(err.has_field("priority"));
        assert!(err.has_field("dueDate"));
        assert_eq!(err.issues().len(), 4);
    }

    #[test]
    fn update_distinguishes_absent_from_null() {
        let patch = TaskPatch::try_from(update(json!({
            "description": null,
            "dueDate": null
        })))
        .expect("nullable fields may be cleared");

        assert_eq!(patch.description, Some(None));
        assert_eq!(patch.due_date, Some(None));
        assert_eq!(patch.title, None);
        assert_eq!(patch.completed, None);

        let empty = TaskPatch::try_from(update(json!({}))).expect("empty body is a no-op");
        assert!(empty.is_empty());
    }

    #[test]
    fn update_keeps_empty_description_and_clears_empty_due_date() {
        let patch = TaskPatch::try_from(update(json!({
            "description": "",
            "dueDate": ""
        })))
        .expect("empty strings are accepted");

        assert_eq!(patch.description, Some(Some(String::new())));
        assert_eq!(patch.due_date, Some(None));
    }

    #[test]
    fn update_rejects_nulls_for_non_nullable_fields() {
        let err = TaskPatch::try_from(update(json!({
            "title": null,
            "completed": null,
            "priority": null
        })))
        .expect_err("non-nullable fields cannot be null");

        assert_eq!(err.issues().len(), 3);
        assert_eq!(
            err.to_string(),
            "title cannot be null; completed cannot be null; priority cannot be null"
        );
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let patch = TaskPatch::try_from(update(json!({
            "id": "ignored",
            "createdAt": "2026-01-01T00:00:00Z",
            "completed": true
        })))
        .expect("extra fields are ignored");

        assert_eq!(patch.completed, Some(true));
    }
}
