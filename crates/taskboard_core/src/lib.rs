//! Core domain logic for the task board.
//! This crate is the single source of truth for task invariants and storage.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{AppEnvironment, ConfigError, ServerConfig};
pub use db::{DbError, DbPool, DbSource, PoolOptions};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::task::{
    parse_due_date, FieldIssue, FieldProblem, NewTask, Priority, Task, TaskId, TaskPatch,
    TaskValidationError,
};
pub use repo::task_repo::{
    RepoError, RepoResult, SortDirection, SqliteTaskRepository, TaskListQuery, TaskRepository,
    TaskSortField,
};
pub use service::task_service::{ServiceResult, TaskService, TaskServiceError};
pub use store::TaskStore;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
