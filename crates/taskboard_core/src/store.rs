//! Async task store handle.
//!
//! # Responsibility
//! - Bundle the connection pool with the task service for async callers.
//! - Give the HTTP layer one injectable handle with an explicit lifecycle.
//!
//! # Invariants
//! - Every call runs on its own pooled connection; no state is shared
//!   between calls beyond the pool.
//! - After `close()` every call fails with `DbError::PoolClosed`.

use crate::db::{DbPool, DbResult, DbSource, PoolOptions};
use crate::model::task::{NewTask, Task, TaskId, TaskPatch, TaskValidationError};
use crate::repo::task_repo::{SqliteTaskRepository, TaskListQuery};
use crate::service::task_service::{ServiceResult, TaskService};
use log::info;

/// Cloneable, injectable handle over the task store.
#[derive(Clone)]
pub struct TaskStore {
    pool: DbPool,
}

impl TaskStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Opens the backing pool and returns a ready store.
    pub fn open(source: DbSource, options: PoolOptions) -> DbResult<Self> {
        Ok(Self::new(DbPool::open(source, options)?))
    }

    /// Opens a store over a fresh in-memory database.
    pub fn in_memory() -> DbResult<Self> {
        Ok(Self::new(DbPool::in_memory()?))
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub async fn list(&self, query: TaskListQuery) -> ServiceResult<Vec<Task>> {
        self.with_service(move |service| service.list_tasks(&query))
            .await
    }

    pub async fn get(&self, id: TaskId) -> ServiceResult<Task> {
        self.with_service(move |service| service.get_task(id)).await
    }

    pub async fn create(&self, input: NewTask) -> ServiceResult<Task> {
        let task = self
            .with_service(move |service| service.create_task(input))
            .await?;
        info!("event=task_create module=store status=ok id={}", task.id);
        Ok(task)
    }

    pub async fn update(&self, id: TaskId, patch: TaskPatch) -> ServiceResult<Task> {
        let task = self
            .with_service(move |service| service.update_task(id, patch))
            .await?;
        info!("event=task_update module=store status=ok id={id}");
        Ok(task)
    }

    /// Updates from a not yet converted input; see `TaskService::update_task_with`.
    pub async fn update_with<F>(&self, id: TaskId, build_patch: F) -> ServiceResult<Task>
    where
        F: FnOnce() -> Result<TaskPatch, TaskValidationError> + Send + 'static,
    {
        let task = self
            .with_service(move |service| service.update_task_with(id, build_patch))
            .await?;
        info!("event=task_update module=store status=ok id={id}");
        Ok(task)
    }

    pub async fn delete(&self, id: TaskId) -> ServiceResult<()> {
        self.with_service(move |service| service.delete_task(id))
            .await?;
        info!("event=task_delete module=store status=ok id={id}");
        Ok(())
    }

    /// Closes the backing pool.
    pub fn close(&self) {
        self.pool.close();
    }

    async fn with_service<T, F>(&self, f: F) -> ServiceResult<T>
    where
        F: FnOnce(&TaskService<SqliteTaskRepository<'_>>) -> ServiceResult<T> + Send + 'static,
        T: Send + 'static,
    {
        self.pool
            .run(move |conn| {
                let repo = SqliteTaskRepository::try_new(conn)?;
                let service = TaskService::new(repo);
                f(&service)
            })
            .await
    }
}
