//! HTTP client for the task board API.
//!
//! # Responsibility
//! - Issue list/get/create/update/delete/health requests.
//! - Surface the server's `{error, message}` envelope as `ClientError`.
//!
//! # Invariants
//! - The default base URL is resolved once per process.
//! - Request bodies never reach the log; only method, URL and status do.

use chrono::{DateTime, Utc};
use log::debug;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::OnceLock;
use std::time::Duration;
use taskboard_api::dto::HealthResponse;
use taskboard_api::ErrorBody;
use taskboard_core::{Priority, Task, TaskId};
use thiserror::Error;

pub const LOCAL_API_URL: &str = "http://localhost:3001/api";
pub const DOCKER_API_URL: &str = "http://backend:3001/api";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const BODY_PREVIEW_LIMIT: usize = 256;

static API_BASE: OnceLock<String> = OnceLock::new();

/// Returns the process-wide API base URL, resolving it on first use.
pub fn default_api_base() -> &'static str {
    API_BASE.get_or_init(|| api_base_from(|key| std::env::var(key).ok()))
}

/// Picks the API base URL from runtime context.
///
/// `TASKBOARD_API_URL` wins when set; otherwise `RUNNING_IN_DOCKER=true`
/// selects the compose service name and anything else selects localhost.
pub fn api_base_from(lookup: impl Fn(&str) -> Option<String>) -> String {
    if let Some(url) = lookup("TASKBOARD_API_URL")
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
    {
        return url;
    }

    let in_docker = lookup("RUNNING_IN_DOCKER")
        .map(|value| value.trim() == "true")
        .unwrap_or(false);
    if in_docker {
        DOCKER_API_URL.to_string()
    } else {
        LOCAL_API_URL.to_string()
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to build http client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered {status}: {message}")]
    Status {
        url: String,
        status: u16,
        /// Error kind from the server envelope, when the body carried one.
        error: Option<String>,
        message: String,
    },

    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }

    fn from_status(status: StatusCode, url: String, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(envelope) => Self::Status {
                url,
                status: status.as_u16(),
                error: Some(envelope.error),
                message: envelope.message,
            },
            Err(_) => Self::Status {
                url,
                status: status.as_u16(),
                error: None,
                message: preview_body(body),
            },
        }
    }
}

/// Filter/sort options forwarded to `GET /tasks`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
}

/// Body sent to `POST /tasks`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskInput {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

impl CreateTaskInput {
    /// An open task with only a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            completed: Some(false),
            ..Self::default()
        }
    }
}

/// Body sent to `PUT /tasks/{id}`; `None` fields are left out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl UpdateTaskInput {
    /// Every mutable field of `task`, as last seen by this client.
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: Some(task.title.clone()),
            description: Some(task.description.clone()),
            completed: Some(task.completed),
            priority: Some(task.priority),
            due_date: Some(task.due_date),
        }
    }
}

/// Operations the presentation board needs from the backend.
#[allow(async_fn_in_trait)]
pub trait TaskApi {
    async fn list_tasks(&self, options: &ListOptions) -> Result<Vec<Task>, ClientError>;
    async fn create_task(&self, input: &CreateTaskInput) -> Result<Task, ClientError>;
    async fn update_task(&self, id: TaskId, input: &UpdateTaskInput) -> Result<Task, ClientError>;
    async fn delete_task(&self, id: TaskId) -> Result<(), ClientError>;
}

#[derive(Debug, Clone)]
pub struct TaskClient {
    http: reqwest::Client,
    base_url: String,
}

impl TaskClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ClientError::Build)?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    /// Client against `default_api_base()`.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(default_api_base())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get_task(&self, id: TaskId) -> Result<Task, ClientError> {
        let url = self.url(&format!("/tasks/{id}"));
        let response = self.send(Method::GET, &url, |req| req).await?;
        decode(response, url).await
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let url = self.url("/health");
        let response = self.send(Method::GET, &url, |req| req).await?;
        decode(response, url).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<reqwest::Response, ClientError> {
        debug!("event=api_call module=client status=start method={method} url={url}");
        let response = build(self.http.request(method.clone(), url))
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        debug!(
            "event=api_call module=client status=done method={method} url={url} http_status={}",
            status.as_u16()
        );
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.to_string(),
                source,
            })?;
        Err(ClientError::from_status(status, url.to_string(), &body))
    }
}

impl TaskApi for TaskClient {
    async fn list_tasks(&self, options: &ListOptions) -> Result<Vec<Task>, ClientError> {
        let url = self.url("/tasks");
        let response = self
            .send(Method::GET, &url, |req| req.query(options))
            .await?;
        decode(response, url).await
    }

    async fn create_task(&self, input: &CreateTaskInput) -> Result<Task, ClientError> {
        let url = self.url("/tasks");
        let response = self.send(Method::POST, &url, |req| req.json(input)).await?;
        decode(response, url).await
    }

    async fn update_task(&self, id: TaskId, input: &UpdateTaskInput) -> Result<Task, ClientError> {
        let url = self.url(&format!("/tasks/{id}"));
        let response = self.send(Method::PUT, &url, |req| req.json(input)).await?;
        decode(response, url).await
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), ClientError> {
        let url = self.url(&format!("/tasks/{id}"));
        self.send(Method::DELETE, &url, |req| req).await?;
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
    url: String,
) -> Result<T, ClientError> {
    let body = response
        .text()
        .await
        .map_err(|source| ClientError::Transport {
            url: url.clone(),
            source,
        })?;
    serde_json::from_str(&body).map_err(|err| ClientError::Decode {
        url,
        message: format!("{err} | body={}", preview_body(&body)),
    })
}

fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    taskboard_core::logging::sanitize_message(trimmed, BODY_PREVIEW_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::{api_base_from, preview_body, UpdateTaskInput, DOCKER_API_URL, LOCAL_API_URL};
    use serde_json::json;
    use std::collections::HashMap;
    use taskboard_core::{NewTask, Task};

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn api_base_prefers_explicit_url_then_docker_then_localhost() {
        assert_eq!(
            api_base_from(lookup_from(&[
                ("TASKBOARD_API_URL", "http://tasks.internal/api"),
                ("RUNNING_IN_DOCKER", "true"),
            ])),
            "http://tasks.internal/api"
        );
        assert_eq!(
            api_base_from(lookup_from(&[("RUNNING_IN_DOCKER", "true")])),
            DOCKER_API_URL
        );
        assert_eq!(
            api_base_from(lookup_from(&[("RUNNING_IN_DOCKER", "yes")])),
            LOCAL_API_URL
        );
        assert_eq!(api_base_from(lookup_from(&[])), LOCAL_API_URL);
    }

    #[test]
    fn update_input_from_task_sends_nulls_for_cleared_fields() {
        let task = Task::from_new(NewTask::new("Buy milk"), chrono::Utc::now());
        let value = serde_json::to_value(UpdateTaskInput::from_task(&task)).unwrap();

        assert_eq!(value["title"], json!("Buy milk"));
        assert_eq!(value["description"], json!(null));
        assert_eq!(value["dueDate"], json!(null));
        assert_eq!(value["completed"], json!(false));
        assert_eq!(value["priority"], json!("medium"));
    }

    #[test]
    fn update_input_omits_untouched_fields() {
        let input = UpdateTaskInput {
            completed: Some(true),
            ..UpdateTaskInput::default()
        };
        assert_eq!(serde_json::to_value(input).unwrap(), json!({"completed": true}));
    }

    #[test]
    fn preview_body_flattens_and_marks_empty() {
        assert_eq!(preview_body("  "), "<empty body>");
        assert_eq!(preview_body("bad\ngateway"), "bad gateway");
    }
}
