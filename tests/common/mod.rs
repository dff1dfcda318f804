#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use echocast::config::Config;
use echocast::context::ExecutionContext;
use echocast::directory::{ConnectionDirectory, SqlDirectory};
use echocast::error::DeliveryError;
use echocast::routes;
use echocast::state::AppState;
use echocast::transport::TransportSender;
use http::{Method, Request};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Transport that records every attempt; ids in `failing` are rejected.
#[derive(Default)]
pub struct RecordingTransport {
    attempts: Mutex<Vec<(String, String)>>,
    failing: HashSet<String>,
}

impl RecordingTransport {
    pub fn failing_for(ids: &[&str]) -> Self {
        Self {
            attempts: Mutex::new(Vec::new()),
            failing: ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Attempts sorted by connection id.
    pub fn attempts(&self) -> Vec<(String, String)> {
        let mut attempts = self.attempts.lock().unwrap().clone();
        attempts.sort();
        attempts
    }
}

#[async_trait]
impl TransportSender for RecordingTransport {
    async fn send(&self, connection_id: &str, data: &[u8]) -> Result<(), DeliveryError> {
        self.attempts.lock().unwrap().push((
            connection_id.to_string(),
            String::from_utf8_lossy(data).into_owned(),
        ));
        if self.failing.contains(connection_id) {
            return Err(DeliveryError::Gone);
        }
        Ok(())
    }
}

/// Test server backed by its own in-memory directory.
/// Each instance is isolated, safe for parallel tests.
pub struct TestServer {
    pub context: Arc<ExecutionContext>,
    pub directory: Arc<SqlDirectory>,
}

impl TestServer {
    pub async fn new() -> Self {
        Self::build(Config::default(), None).await
    }

    pub async fn with_config(config: Config) -> Self {
        Self::build(config, None).await
    }

    pub async fn with_transport(config: Config, transport: Arc<dyn TransportSender>) -> Self {
        Self::build(config, Some(transport)).await
    }

    async fn build(config: Config, transport: Option<Arc<dyn TransportSender>>) -> Self {
        let directory = Arc::new(
            SqlDirectory::connect("sqlite::memory:")
                .await
                .expect("failed to create test directory"),
        );
        let mut context = ExecutionContext::with_directory(config, directory.clone());
        if let Some(transport) = transport {
            context = context.with_transport(transport);
        }
        Self {
            context: Arc::new(context),
            directory,
        }
    }

    /// Returns an Axum Router wired to this server's context for `oneshot()` calls.
    pub fn router(&self) -> axum::Router {
        routes::router(AppState::new(Arc::clone(&self.context)))
    }

    /// Binds a TCP listener on port 0, spawns the server, and returns `host:port`.
    pub async fn spawn(&self) -> String {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("127.0.0.1:{}", addr.port())
    }

    pub async fn active(&self) -> Vec<String> {
        self.directory.list_active().await.unwrap()
    }

    /// Polls the directory until `n` connections are active.
    pub async fn wait_for_active(&self, n: usize) {
        for _ in 0..200 {
            if self.active().await.len() == n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected {n} active connections, found {:?}",
            self.active().await
        );
    }
}

pub fn event(kind: &str, connection_id: &str, body: &str) -> serde_json::Value {
    serde_json::json!({
        "kind": kind,
        "connectionId": connection_id,
        "body": body,
        "replyContext": { "domain": "localhost", "stage": "test" }
    })
}

pub fn json_request(method: Method, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

pub fn event_request(kind: &str, connection_id: &str, body: &str) -> Request<Body> {
    json_request(Method::POST, "/events", &event(kind, connection_id, body))
}

pub async fn parse_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
