//! Route handlers for tasks and health.

use crate::dto::{CreateTaskRequest, HealthResponse, ListTasksParams, UpdateTaskRequest};
use crate::error::ApiError;
use crate::AppState;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use taskboard_core::{NewTask, Task, TaskId, TaskPatch};
use uuid::Uuid;

/// JSON body extractor answering malformed bodies with the error envelope.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path extractor; a path segment that cannot be decoded names no task.
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Query extractor answering malformed query strings with the error envelope.
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

pub async fn list_tasks(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListTasksParams>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = state
        .store
        .list(params.into())
        .await
        .map_err(|err| state.reject(err))?;
    Ok(Json(tasks))
}

pub async fn get_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Task>, ApiError> {
    let id = parse_task_id(&id)?;
    let task = state.store.get(id).await.map_err(|err| state.reject(err))?;
    Ok(Json(task))
}

pub async fn create_task(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = NewTask::try_from(request)?;
    let task = state
        .store
        .create(input)
        .await
        .map_err(|err| state.reject(err))?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    let id = parse_task_id(&id)?;
    let task = state
        .store
        .update_with(id, move || TaskPatch::try_from(request))
        .await
        .map_err(|err| state.reject(err))?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_task_id(&id)?;
    state
        .store
        .delete(id)
        .await
        .map_err(|err| state.reject(err))?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::up())
}

pub async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}

/// Ids that are not UUIDs cannot name a stored task.
fn parse_task_id(raw: &str) -> Result<TaskId, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::TaskNotFound)
}
