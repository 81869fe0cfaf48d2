//! Common test utilities for E2E testing.
//!
//! Tests spawn the real server binary against a temp database, with a stub
//! task-execution service standing in for the external generative backend.

#![allow(dead_code)]

use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path as AxumPath, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::time::sleep;

/// Find an available port
pub fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// A stub task-execution service.
///
/// Accepts every submission, hands out sequential task ids, and reports every
/// polled task as done so gated stages proceed immediately.
pub struct StubTaskService {
    pub port: u16,
    pub submissions: Arc<AtomicUsize>,
}

impl StubTaskService {
    pub async fn spawn() -> Self {
        let submissions = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&submissions);

        let app = Router::new()
            .route(
                "/v1/tasks",
                post(|State(counter): State<Arc<AtomicUsize>>, _body: Json<Value>| async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    Json(json!({ "id": format!("task-{}", n), "status": "queued" }))
                }),
            )
            .route(
                "/v1/tasks/{id}",
                get(|AxumPath(id): AxumPath<String>| async move {
                    Json(json!({ "id": id, "status": "done" }))
                }),
            )
            .with_state(counter);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { port, submissions }
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }
}

/// A spawned server with its scratch directory.
pub struct TestServer {
    pub port: u16,
    pub temp_dir: TempDir,
    child: tokio::process::Child,
}

impl TestServer {
    /// Spawn the server binary with a fast-pipeline config pointed at the
    /// given task service.
    pub async fn spawn(task_service_port: u16) -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let port = get_available_port();

        let config = format!(
            r#"
[server]
host = "127.0.0.1"
port = {port}

[database]
path = "{db}"

[dispatcher]
api_base = "http://127.0.0.1:{task_port}"
timeout_secs = 5

[pipeline]
stage_delay_secs = 0
worker_poll_interval_ms = 50
"#,
            port = port,
            db = temp_dir.path().join("slateforge.db").display(),
            task_port = task_service_port,
        );
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, config).unwrap();

        let child = spawn_server(&config_path).await;
        let server = Self {
            port,
            temp_dir,
            child,
        };
        assert!(
            wait_for_server(server.port, 100).await,
            "Server failed to start"
        );
        server
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }
}

/// Spawn the server and return a handle
pub async fn spawn_server(config_path: &Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_slateforge"))
        .env("SLATEFORGE_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

/// Wait for server to be ready
pub async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/api/v1/health", port))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

/// Write a minimal config file into a temp dir and return both.
pub fn minimal_config(port: u16) -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = format!(
        r#"
[server]
host = "127.0.0.1"
port = {}

[database]
path = "{}"
"#,
        port,
        temp_dir.path().join("slateforge.db").display(),
    );
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, config).unwrap();
    (temp_dir, config_path)
}
