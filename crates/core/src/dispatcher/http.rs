//! HTTP client for the external task-execution service.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::types::{DispatchError, TaskHandle, TaskRequest, TaskState};
use super::TaskDispatcher;

/// HTTP implementation of [`TaskDispatcher`].
///
/// Submission is fire-and-forget: the service answers with a handle and makes
/// no promise to ever notify us of completion. `poll` is a best-effort probe
/// against the same handle.
pub struct HttpDispatcher {
    client: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
}

impl HttpDispatcher {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        self
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("x-api-key", key),
            None => request,
        }
    }

    fn map_send_error(e: reqwest::Error) -> DispatchError {
        if e.is_timeout() {
            DispatchError::Timeout(Duration::from_secs(0))
        } else {
            DispatchError::Http(e.to_string())
        }
    }
}

#[derive(Debug, Serialize)]
struct SubmitTaskBody<'a> {
    prompt: &'a str,
    mode: &'a str,
    connectors: &'a [String],
}

#[derive(Debug, Deserialize)]
struct TaskResponse {
    id: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

async fn decode_error(response: reqwest::Response) -> DispatchError {
    let status = response.status().as_u16();
    let error_text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiError>(&error_text)
        .map(|e| e.error.message)
        .unwrap_or(error_text);
    DispatchError::Api { status, message }
}

#[async_trait]
impl TaskDispatcher for HttpDispatcher {
    fn provider(&self) -> &str {
        "http"
    }

    async fn submit(&self, request: TaskRequest) -> Result<TaskHandle, DispatchError> {
        let body = SubmitTaskBody {
            prompt: &request.prompt,
            mode: request.mode.as_str(),
            connectors: &request.connectors,
        };

        let response = self
            .apply_auth(self.client.post(format!("{}/v1/tasks", self.api_base)))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        if !response.status().is_success() {
            return Err(decode_error(response).await);
        }

        let task: TaskResponse = response
            .json()
            .await
            .map_err(|e| DispatchError::Json(e.to_string()))?;

        Ok(TaskHandle {
            id: task.id,
            status: task.status,
        })
    }

    async fn poll(&self, task_id: &str) -> Result<Option<TaskState>, DispatchError> {
        let response = self
            .apply_auth(
                self.client
                    .get(format!("{}/v1/tasks/{}", self.api_base, task_id)),
            )
            .send()
            .await
            .map_err(Self::map_send_error)?;

        // A handle the service no longer knows about is "unknown", not an error.
        if response.status().as_u16() == 404 {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(decode_error(response).await);
        }

        let task: TaskResponse = response
            .json()
            .await
            .map_err(|e| DispatchError::Json(e.to_string()))?;

        Ok(task.status.as_deref().and_then(TaskState::from_label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::ExecutionMode;

    #[test]
    fn test_dispatcher_creation() {
        let dispatcher = HttpDispatcher::new("http://localhost:8791");
        assert_eq!(dispatcher.provider(), "http");
        assert!(dispatcher.api_key.is_none());
    }

    #[test]
    fn test_dispatcher_with_api_key() {
        let dispatcher = HttpDispatcher::new("http://localhost:8791").with_api_key("secret");
        assert_eq!(dispatcher.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_submit_body_serialization() {
        let request = TaskRequest::new("generate things")
            .with_mode(ExecutionMode::Quality)
            .with_connectors(["slate-store"]);
        let body = SubmitTaskBody {
            prompt: &request.prompt,
            mode: request.mode.as_str(),
            connectors: &request.connectors,
        };

        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"prompt\":\"generate things\""));
        assert!(json.contains("\"mode\":\"quality\""));
        assert!(json.contains("\"connectors\":[\"slate-store\"]"));
    }

    #[test]
    fn test_task_response_deserialization() {
        let task: TaskResponse = serde_json::from_str(r#"{"id":"t-42","status":"queued"}"#).unwrap();
        assert_eq!(task.id, "t-42");
        assert_eq!(task.status.as_deref(), Some("queued"));

        let bare: TaskResponse = serde_json::from_str(r#"{"id":"t-43"}"#).unwrap();
        assert!(bare.status.is_none());
    }
}
