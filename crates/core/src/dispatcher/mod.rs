//! Boundary to the external natural-language task-execution service.
//!
//! Submissions are fire-and-forget: the service returns a handle immediately
//! and does not promise any completion notification. Errors propagate
//! synchronously; there is no retry at this layer.

mod http;
mod types;

use async_trait::async_trait;

pub use http::HttpDispatcher;
pub use types::{DispatchError, ExecutionMode, TaskHandle, TaskRequest, TaskState};

/// Trait for task dispatch backends.
#[async_trait]
pub trait TaskDispatcher: Send + Sync {
    /// Backend name (e.g. "http", "mock").
    fn provider(&self) -> &str;

    /// Submit a task and return its handle. Fire-and-forget: a returned
    /// handle means the service accepted the task, nothing more.
    async fn submit(&self, request: TaskRequest) -> Result<TaskHandle, DispatchError>;

    /// Probe the status of a previously submitted task. `Ok(None)` means the
    /// service reported nothing usable; callers must not treat that as
    /// failure.
    async fn poll(&self, task_id: &str) -> Result<Option<TaskState>, DispatchError>;
}
