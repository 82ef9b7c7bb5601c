//! HTTP API for the task board.
//!
//! # Responsibility
//! - Expose task CRUD and a liveness probe over JSON.
//! - Mount every task route under both `/tasks` and `/api/tasks`.
//!
//! # Invariants
//! - Handlers only talk to storage through the injected `TaskStore`.
//! - Every failure answers with the `{error, message}` envelope.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;

use axum::routing::get;
use axum::Router;
use taskboard_core::{AppEnvironment, TaskServiceError, TaskStore};

pub use error::{ApiError, ErrorBody};
pub use server::{run, serve, shutdown_signal, ServeError};

const TASK_PREFIXES: [&str; 2] = ["/tasks", "/api/tasks"];
const HEALTH_PATHS: [&str; 2] = ["/health", "/api/health"];

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: TaskStore,
    pub environment: AppEnvironment,
}

impl AppState {
    pub fn new(store: TaskStore, environment: AppEnvironment) -> Self {
        Self { store, environment }
    }

    fn reject(&self, err: TaskServiceError) -> ApiError {
        ApiError::from_service(err, self.environment)
    }
}

/// Builds the full application router with middleware applied.
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new();
    for prefix in TASK_PREFIXES {
        router = router
            .route(
                prefix,
                get(handlers::list_tasks).post(handlers::create_task),
            )
            .route(
                &format!("{prefix}/{{id}}"),
                get(handlers::get_task)
                    .put(handlers::update_task)
                    .delete(handlers::delete_task),
            );
    }
    for path in HEALTH_PATHS {
        router = router.route(path, get(handlers::health));
    }

    let router = router
        .fallback(handlers::route_not_found)
        .method_not_allowed_fallback(handlers::route_not_found)
        .layer(axum::middleware::from_fn(middleware::request_logger));
    let router = middleware::security_header_layers()
        .into_iter()
        .fold(router, |router, layer| router.layer(layer));

    router.layer(middleware::cors_layer()).with_state(state)
}
