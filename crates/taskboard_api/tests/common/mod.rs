#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use taskboard_api::{build_router, AppState};
use taskboard_core::{AppEnvironment, TaskStore};
use tower::ServiceExt;

pub fn test_app() -> Router {
    test_app_with(TaskStore::in_memory().unwrap(), AppEnvironment::Development)
}

pub fn test_app_with(store: TaskStore, environment: AppEnvironment) -> Router {
    build_router(AppState::new(store, environment))
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await;
    split(response).await
}

pub async fn send_json(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = send(
        app,
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await;
    split(response).await
}

pub async fn delete(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = send(
        app,
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    split(response).await
}

/// Creates a task through the API and returns its JSON representation.
pub async fn create_task(app: &Router, body: Value) -> Value {
    let (status, task) = send_json(app, "POST", "/api/tasks", body).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {task}");
    task
}

/// Returns status and body; empty bodies become `Value::Null`.
pub async fn split(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        return (status, Value::Null);
    }
    (status, serde_json::from_slice(&bytes).unwrap())
}
