//! Test doubles for the directory and transport contracts.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::directory::ConnectionDirectory;
use crate::error::{DeliveryError, DirectoryError};
use crate::models::connection::{Connection, ConnectionStatus};
use crate::transport::TransportSender;

/// Directory with a fixed active set that counts reads.
pub struct StaticDirectory {
    active: Vec<String>,
    reads: AtomicUsize,
    fail_reads: bool,
}

impl StaticDirectory {
    pub fn new(active: &[&str]) -> Self {
        Self {
            active: active.iter().map(|s| s.to_string()).collect(),
            reads: AtomicUsize::new(0),
            fail_reads: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_reads: true,
            ..Self::new(&[])
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectionDirectory for StaticDirectory {
    async fn list_active(&self) -> Result<Vec<String>, DirectoryError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads {
            return Err(DirectoryError::Database(sqlx::Error::PoolClosed));
        }
        Ok(self.active.clone())
    }

    async fn add(&self, _connection_id: &str) -> Result<(), DirectoryError> {
        Ok(())
    }

    async fn mark_closed(&self, _connection_id: &str) -> Result<(), DirectoryError> {
        Ok(())
    }

    async fn get(&self, connection_id: &str) -> Result<Option<Connection>, DirectoryError> {
        Ok(self
            .active
            .iter()
            .find(|id| *id == connection_id)
            .map(|id| Connection {
                connection_id: id.clone(),
                created_at: String::new(),
                disconnected_at: None,
                status: ConnectionStatus::Active,
            }))
    }
}

/// Records every delivery attempt; ids in `failing` are rejected.
#[derive(Default)]
pub struct RecordingTransport {
    attempts: Mutex<Vec<(String, String)>>,
    failing: HashSet<String>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(ids: &[&str]) -> Self {
        Self {
            attempts: Mutex::new(Vec::new()),
            failing: ids.iter().map(|s| s.to_string()).collect(),
        }
    }

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

/// Holds every send for `delay` before reporting success. Optionally fires a
/// cancellation token as soon as the first send starts.
pub struct StallingTransport {
    delay: Duration,
    cancel_on_send: Option<CancellationToken>,
    started: AtomicUsize,
    completed: Mutex<Vec<String>>,
}

impl StallingTransport {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            cancel_on_send: None,
            started: AtomicUsize::new(0),
            completed: Mutex::new(Vec::new()),
        }
    }

    pub fn cancelling(mut self, token: CancellationToken) -> Self {
        self.cancel_on_send = Some(token);
        self
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> Vec<String> {
        let mut completed = self.completed.lock().unwrap().clone();
        completed.sort();
        completed
    }
}

#[async_trait]
impl TransportSender for StallingTransport {
    async fn send(&self, connection_id: &str, _data: &[u8]) -> Result<(), DeliveryError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        if let Some(ref token) = self.cancel_on_send {
            token.cancel();
        }
        tokio::time::sleep(self.delay).await;
        self.completed
            .lock()
            .unwrap()
            .push(connection_id.to_string());
        Ok(())
    }
}

/// Collects formatted log lines written while it is the default subscriber.
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
