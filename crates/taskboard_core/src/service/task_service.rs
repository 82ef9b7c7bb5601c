//! Task use-case service.
//!
//! # Responsibility
//! - Provide list/get/create/update/delete use-cases over a repository.
//! - Own the shared lookup-by-id step used by get/update/delete.
//! - Maintain `created_at`/`updated_at` on behalf of callers.
//!
//! # Invariants
//! - Create validates before any repository call.
//! - Update resolves the target task first; an unknown id is reported as
//!   not found whatever the patch contains.
//! - Updates apply only provided fields; a patch that changes nothing does
//!   not write and keeps `updated_at`.
//! - Writes are followed by a read-back so callers see stored state.

use crate::db::DbError;
use crate::model::task::{now_millis, NewTask, Task, TaskId, TaskPatch, TaskValidationError};
use crate::repo::task_repo::{RepoError, TaskListQuery, TaskRepository};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, TaskServiceError>;

/// Service error for task use-cases.
#[derive(Debug)]
pub enum TaskServiceError {
    /// Input failed validation; nothing was written.
    Validation(TaskValidationError),
    /// Target task does not exist.
    TaskNotFound(TaskId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent task state: {details}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TaskServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::TaskNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<TaskValidationError> for TaskServiceError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for TaskServiceError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::Db(value))
    }
}

/// Task service facade over repository implementations.
pub struct TaskService<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> TaskService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists all tasks matching the filter, in the requested order.
    pub fn list_tasks(&self, query: &TaskListQuery) -> ServiceResult<Vec<Task>> {
        Ok(self.repo.list_tasks(query)?)
    }

    /// Gets one task by id.
    pub fn get_task(&self, id: TaskId) -> ServiceResult<Task> {
        self.require_task(id)
    }

    /// Creates one task and returns the stored record.
    pub fn create_task(&self, input: NewTask) -> ServiceResult<Task> {
        input.validate()?;

        let task = Task::from_new(input, now_millis());
        let id = self.repo.create_task(&task)?;
        self.repo
            .get_task(id)?
            .ok_or(TaskServiceError::InconsistentState(
                "created task not found in read-back",
            ))
    }

    /// Applies a partial update and returns the stored record.
    pub fn update_task(&self, id: TaskId, patch: TaskPatch) -> ServiceResult<Task> {
        self.update_task_with(id, || Ok(patch))
    }

    /// Like `update_task`, but builds the patch only once the task is known
    /// to exist, so conversion errors never mask a missing task.
    pub fn update_task_with<F>(&self, id: TaskId, build_patch: F) -> ServiceResult<Task>
    where
        F: FnOnce() -> Result<TaskPatch, TaskValidationError>,
    {
        let mut task = self.require_task(id)?;
        let patch = build_patch()?;
        patch.validate()?;

        if !task.apply_patch(patch) {
            debug!("event=task_update module=service status=noop id={id}");
            return Ok(task);
        }

        task.updated_at = now_millis().max(task.updated_at);
        self.repo.update_task(&task)?;
        self.repo
            .get_task(id)?
            .ok_or(TaskServiceError::InconsistentState(
                "updated task not found in read-back",
            ))
    }

    /// Deletes one task by id.
    pub fn delete_task(&self, id: TaskId) -> ServiceResult<()> {
        self.require_task(id)?;
        Ok(self.repo.delete_task(id)?)
    }

    fn require_task(&self, id: TaskId) -> ServiceResult<Task> {
        self.repo
            .get_task(id)?
            .ok_or(TaskServiceError::TaskNotFound(id))
    }
}
