//! Types for the external task dispatcher boundary.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Error type for dispatch operations.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Not configured")]
    NotConfigured,
}

/// Execution mode hint for the task service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Speed,
    Quality,
    Fast,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Speed => "speed",
            ExecutionMode::Quality => "quality",
            ExecutionMode::Fast => "fast",
        }
    }
}

/// A natural-language task submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    /// The task specification text.
    pub prompt: String,
    /// Execution mode hint.
    pub mode: ExecutionMode,
    /// Connectors the task needs access to.
    pub connectors: Vec<String>,
}

impl TaskRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            mode: ExecutionMode::Quality,
            connectors: vec![],
        }
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_connectors<I, S>(mut self, connectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.connectors = connectors.into_iter().map(Into::into).collect();
        self
    }
}

/// Handle returned by a task submission.
///
/// The service promises nothing beyond the id: `status`, when present, is a
/// snapshot at submission time, and the service may never report completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskHandle {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Best-effort task state reported by a status probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Queued,
    Running,
    Done,
    Failed,
}

impl TaskState {
    /// Map a service-reported status label to a known state, if possible.
    pub fn from_label(label: &str) -> Option<TaskState> {
        match label.to_lowercase().as_str() {
            "queued" | "pending" | "accepted" => Some(TaskState::Queued),
            "running" | "in_progress" | "processing" => Some(TaskState::Running),
            "done" | "completed" | "succeeded" | "success" => Some(TaskState::Done),
            "failed" | "error" | "cancelled" => Some(TaskState::Failed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_request_builder() {
        let request = TaskRequest::new("do the thing")
            .with_mode(ExecutionMode::Speed)
            .with_connectors(["web-search", "slate-store"]);

        assert_eq!(request.prompt, "do the thing");
        assert_eq!(request.mode, ExecutionMode::Speed);
        assert_eq!(request.connectors, vec!["web-search", "slate-store"]);
    }

    #[test]
    fn test_task_request_serialization() {
        let request = TaskRequest::new("hello").with_mode(ExecutionMode::Fast);
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"mode\":\"fast\""));
        assert!(json.contains("\"connectors\":[]"));
    }

    #[test]
    fn test_task_state_from_label() {
        assert_eq!(TaskState::from_label("Running"), Some(TaskState::Running));
        assert_eq!(TaskState::from_label("completed"), Some(TaskState::Done));
        assert_eq!(TaskState::from_label("pending"), Some(TaskState::Queued));
        assert_eq!(TaskState::from_label("error"), Some(TaskState::Failed));
        assert_eq!(TaskState::from_label("vibing"), None);
    }

    #[test]
    fn test_task_handle_optional_status() {
        let handle: TaskHandle = serde_json::from_str(r#"{"id":"t-1"}"#).unwrap();
        assert_eq!(handle.id, "t-1");
        assert!(handle.status.is_none());
    }
}
