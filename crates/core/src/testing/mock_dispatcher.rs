//! Mock task dispatcher for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::dispatcher::{DispatchError, TaskDispatcher, TaskHandle, TaskRequest, TaskState};

/// Mock implementation of the TaskDispatcher trait.
///
/// Provides controllable behavior for testing:
/// - Records every submission for assertions
/// - Fails submissions from a configurable index onward
/// - Returns scripted poll states per task id
///
/// Handles are issued as `task-0`, `task-1`, ... in submission order.
pub struct MockDispatcher {
    /// Recorded submissions, including failed ones.
    submissions: Arc<RwLock<Vec<TaskRequest>>>,
    /// Submissions with index >= this value fail.
    fail_from: Arc<RwLock<Option<usize>>>,
    /// Exactly this submission index fails.
    fail_only: Arc<RwLock<Option<usize>>>,
    /// Scripted poll states by task id.
    poll_states: Arc<RwLock<HashMap<String, TaskState>>>,
    /// Submission counter, also used for handle ids.
    counter: AtomicUsize,
}

impl std::fmt::Debug for MockDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDispatcher")
            .field("submissions", &"<submissions>")
            .field("fail_from", &"<fail_from>")
            .field("poll_states", &"<poll_states>")
            .finish()
    }
}

impl Default for MockDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDispatcher {
    /// Create a new mock dispatcher that accepts everything.
    pub fn new() -> Self {
        Self {
            submissions: Arc::new(RwLock::new(Vec::new())),
            fail_from: Arc::new(RwLock::new(None)),
            fail_only: Arc::new(RwLock::new(None)),
            poll_states: Arc::new(RwLock::new(HashMap::new())),
            counter: AtomicUsize::new(0),
        }
    }

    /// Fail every submission whose zero-based index is >= `index`.
    pub async fn fail_from(&self, index: usize) {
        *self.fail_from.write().await = Some(index);
    }

    /// Fail exactly the submission with this zero-based index.
    pub async fn fail_only(&self, index: usize) {
        *self.fail_only.write().await = Some(index);
    }

    /// Script the state returned by `poll` for one task id.
    pub async fn set_poll_state(&self, task_id: &str, state: TaskState) {
        self.poll_states
            .write()
            .await
            .insert(task_id.to_string(), state);
    }

    /// All recorded submissions, in order. Failed submissions are included.
    pub async fn submissions(&self) -> Vec<TaskRequest> {
        self.submissions.read().await.clone()
    }
}

#[async_trait]
impl TaskDispatcher for MockDispatcher {
    fn provider(&self) -> &str {
        "mock"
    }

    async fn submit(&self, request: TaskRequest) -> Result<TaskHandle, DispatchError> {
        let index = self.counter.fetch_add(1, Ordering::SeqCst);
        self.submissions.write().await.push(request);

        let fail_from = self.fail_from.read().await.is_some_and(|n| index >= n);
        let fail_only = *self.fail_only.read().await == Some(index);
        if fail_from || fail_only {
            return Err(DispatchError::Api {
                status: 503,
                message: "mock dispatcher configured to fail".to_string(),
            });
        }

        Ok(TaskHandle {
            id: format!("task-{}", index),
            status: Some("queued".to_string()),
        })
    }

    async fn poll(&self, task_id: &str) -> Result<Option<TaskState>, DispatchError> {
        Ok(self.poll_states.read().await.get(task_id).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::ExecutionMode;

    #[tokio::test]
    async fn test_records_submissions_and_issues_sequential_handles() {
        let dispatcher = MockDispatcher::new();

        let first = dispatcher
            .submit(TaskRequest::new("one").with_mode(ExecutionMode::Fast))
            .await
            .unwrap();
        let second = dispatcher.submit(TaskRequest::new("two")).await.unwrap();

        assert_eq!(first.id, "task-0");
        assert_eq!(second.id, "task-1");

        let submissions = dispatcher.submissions().await;
        assert_eq!(submissions.len(), 2);
        assert_eq!(submissions[0].prompt, "one");
        assert_eq!(submissions[1].prompt, "two");
    }

    #[tokio::test]
    async fn test_fail_from_index() {
        let dispatcher = MockDispatcher::new();
        dispatcher.fail_from(1).await;

        assert!(dispatcher.submit(TaskRequest::new("ok")).await.is_ok());
        let result = dispatcher.submit(TaskRequest::new("fails")).await;
        assert!(matches!(result, Err(DispatchError::Api { status: 503, .. })));

        // Failed submissions are still recorded.
        assert_eq!(dispatcher.submissions().await.len(), 2);
    }

    #[tokio::test]
    async fn test_poll_returns_scripted_state() {
        let dispatcher = MockDispatcher::new();

        assert_eq!(dispatcher.poll("task-0").await.unwrap(), None);

        dispatcher.set_poll_state("task-0", TaskState::Running).await;
        assert_eq!(
            dispatcher.poll("task-0").await.unwrap(),
            Some(TaskState::Running)
        );
    }
}
