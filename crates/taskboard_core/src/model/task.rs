//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record shared by storage, API and client.
//! - Define validated inputs for create (`NewTask`) and partial update
//!   (`TaskPatch`).
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `title` is never blank once a task exists.
//! - `priority` is always one of `low|medium|high`.
//! - Timestamps carry millisecond precision, matching storage.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for every task.
pub type TaskId = Uuid;

/// Task priority.
///
/// Ordering follows declaration order: `Low < Medium < High`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Accepted wire values, used in validation messages.
    pub const EXPECTED: &'static str = "one of low|medium|high";

    /// Returns the canonical wire/storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Parses the canonical lowercase name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Builds a new task record from validated input with a generated id.
    ///
    /// # Invariants
    /// - `created_at == updated_at == now`.
    pub fn from_new(input: NewTask, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            completed: input.completed,
            priority: input.priority,
            due_date: input.due_date,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validates record-level invariants.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        let mut error = TaskValidationError::default();
        if self.id.is_nil() {
            error.push("id", FieldProblem::Invalid { expected: "a non-nil uuid" });
        }
        if is_blank(&self.title) {
            error.push("title", FieldProblem::Blank);
        }
        error.into_result()
    }

    /// Applies a patch in place and reports whether any stored field changed.
    ///
    /// `updated_at` is not touched here; the repository owns timestamps.
    pub fn apply_patch(&mut self, patch: TaskPatch) -> bool {
        let mut changed = false;

        if let Some(title) = patch.title {
            changed |= replace(&mut self.title, title);
        }
        if let Some(description) = patch.description {
            changed |= replace(&mut self.description, description);
        }
        if let Some(completed) = patch.completed {
            changed |= replace(&mut self.completed, completed);
        }
        if let Some(priority) = patch.priority {
            changed |= replace(&mut self.priority, priority);
        }
        if let Some(due_date) = patch.due_date {
            changed |= replace(&mut self.due_date, due_date);
        }

        changed
    }
}

/// Validated create input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
}

impl NewTask {
    /// Creates an input with only a title and default optional fields.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            completed: false,
            priority: Priority::default(),
            due_date: None,
        }
    }

    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if is_blank(&self.title) {
            return Err(TaskValidationError::single("title", FieldProblem::Blank));
        }
        Ok(())
    }
}

/// Partial update input.
///
/// The outer `Option` tells whether a field was provided at all. For
/// nullable columns the inner `Option` carries an explicit `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl TaskPatch {
    /// Returns whether no field was provided.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }

    pub fn validate(&self) -> Result<(), TaskValidationError> {
        match self.title.as_deref() {
            Some(title) if is_blank(title) => {
                Err(TaskValidationError::single("title", FieldProblem::Blank))
            }
            _ => Ok(()),
        }
    }
}

/// What is wrong with one input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldProblem {
    /// Required field was not provided.
    Missing,
    /// Text field is empty or whitespace only.
    Blank,
    /// Field was sent as `null` but the column is not nullable.
    NotNullable,
    /// Field value could not be interpreted.
    Invalid { expected: &'static str },
}

/// One rejected input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: &'static str,
    pub problem: FieldProblem,
}

impl Display for FieldIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let field = self.field;
        match self.problem {
            FieldProblem::Missing => write!(f, "{field} is required"),
            FieldProblem::Blank => write!(f, "{field} must not be empty"),
            FieldProblem::NotNullable => write!(f, "{field} cannot be null"),
            FieldProblem::Invalid { expected } => write!(f, "{field} must be {expected}"),
        }
    }
}

/// Validation error listing every rejected field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskValidationError {
    issues: Vec<FieldIssue>,
}

impl TaskValidationError {
    pub fn single(field: &'static str, problem: FieldProblem) -> Self {
        let mut error = Self::default();
        error.push(field, problem);
        error
    }

    pub fn push(&mut self, field: &'static str, problem: FieldProblem) {
        self.issues.push(FieldIssue { field, problem });
    }

    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    /// Returns whether any issue targets `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.issues.iter().any(|issue| issue.field == field)
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Converts an accumulated error into `Ok(())` when nothing was rejected.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl Error for TaskValidationError {}

/// Returns the current time truncated to storage precision (milliseconds).
pub fn now_millis() -> DateTime<Utc> {
    truncate_to_millis(Utc::now())
}

/// Drops sub-millisecond precision so values survive a storage round-trip.
pub fn truncate_to_millis(value: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(value.timestamp_millis()).unwrap_or(value)
}

/// Parses a due date given as RFC 3339 or as a plain `YYYY-MM-DD` date.
///
/// Plain dates resolve to midnight UTC. Returns `None` for anything else.
pub fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(truncate_to_millis(parsed.with_timezone(&Utc)));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
