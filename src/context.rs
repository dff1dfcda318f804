//! Per-process execution context.
//!
//! Each context owns its own directory handle and HTTP client, built lazily on
//! first use and reused for the rest of the context's life. Two contexts never
//! share these handles implicitly.

use std::future::Future;
use std::sync::{Arc, OnceLock};
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::{Config, TransportMode};
use crate::directory::{ConnectionDirectory, SqlDirectory};
use crate::error::HandlerError;
use crate::handler::broadcaster::Broadcaster;
use crate::handler::{self, EventOutcome};
use crate::models::event::{InboundEvent, ReplyContext};
use crate::transport::hub::SocketHub;
use crate::transport::management::ManagementApiTransport;
use crate::transport::TransportSender;

type DirectorySlot = Result<Arc<dyn ConnectionDirectory>, String>;

pub struct ExecutionContext {
    config: Config,
    /// A failed construction is kept: the context stays unavailable.
    directory: OnceCell<DirectorySlot>,
    http: OnceLock<reqwest::Client>,
    hub: SocketHub,
    transport_override: Option<Arc<dyn TransportSender>>,
    broadcaster: Broadcaster,
    lifetime: CancellationToken,
    /// Every handler task, so teardown can wait for committed fan-outs.
    tasks: TaskTracker,
}

impl ExecutionContext {
    pub fn new(config: Config) -> Self {
        let broadcaster = Broadcaster::new(config.max_delay);
        Self {
            config,
            directory: OnceCell::new(),
            http: OnceLock::new(),
            hub: SocketHub::new(),
            transport_override: None,
            broadcaster,
            lifetime: CancellationToken::new(),
            tasks: TaskTracker::new(),
        }
    }

    /// Context with an already-constructed directory.
    pub fn with_directory(config: Config, directory: Arc<dyn ConnectionDirectory>) -> Self {
        let ctx = Self::new(config);
        let _ = ctx.directory.set(Ok(directory));
        ctx
    }

    /// Replaces the configured transport for every event.
    pub fn with_transport(mut self, transport: Arc<dyn TransportSender>) -> Self {
        self.transport_override = Some(transport);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn hub(&self) -> &SocketHub {
        &self.hub
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    pub async fn directory(&self) -> Result<Arc<dyn ConnectionDirectory>, HandlerError> {
        let slot = self
            .directory
            .get_or_init(|| async {
                match SqlDirectory::connect(&self.config.database_url).await {
                    Ok(directory) => {
                        tracing::info!("connection directory ready");
                        Ok(Arc::new(directory) as Arc<dyn ConnectionDirectory>)
                    }
                    Err(e) => {
                        tracing::error!("failed to construct connection directory: {e}");
                        Err(e.to_string())
                    }
                }
            })
            .await;

        match slot {
            Ok(directory) => Ok(Arc::clone(directory)),
            Err(reason) => Err(HandlerError::ContextUnavailable(reason.clone())),
        }
    }

    /// `false` once directory construction has failed in this context.
    pub fn is_available(&self) -> bool {
        !matches!(self.directory.get(), Some(Err(_)))
    }

    pub fn transport_for(&self, reply_context: &ReplyContext) -> Arc<dyn TransportSender> {
        if let Some(ref transport) = self.transport_override {
            return Arc::clone(transport);
        }
        match self.config.transport {
            TransportMode::Local => Arc::new(self.hub.clone()) as Arc<dyn TransportSender>,
            TransportMode::Gateway => {
                let client = self.http.get_or_init(reqwest::Client::new).clone();
                Arc::new(ManagementApiTransport::new(
                    client,
                    &self.config.gateway_scheme,
                    reply_context,
                ))
            }
        }
    }

    /// Cancellation signal for one invocation. It fires at the invocation
    /// timeout, on context shutdown, or when the caller cancels it.
    pub fn begin_invocation(&self) -> CancellationToken {
        let token = self.lifetime.child_token();
        let deadline = self.config.invocation_timeout;
        let timer = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = timer.cancelled() => {}
                () = tokio::time::sleep(deadline) => {
                    tracing::warn!("invocation timed out after {}s", deadline.as_secs());
                    timer.cancel();
                }
            }
        });
        token
    }

    /// Handles one event in its own task. Dropping the returned future cancels
    /// the invocation: a pending wait aborts with no side effects, while a
    /// fan-out that already started runs to completion.
    pub async fn invoke(self: &Arc<Self>, event: InboundEvent) -> Result<EventOutcome, HandlerError> {
        let cancel = self.begin_invocation();
        let _guard = cancel.clone().drop_guard();

        let ctx = Arc::clone(self);
        let handle = self
            .tasks
            .spawn(async move { handler::route(&ctx, &event, &cancel).await });

        match handle.await {
            Ok(result) => result,
            Err(e) => Err(HandlerError::TaskFailed(e.to_string())),
        }
    }

    /// Runs `task` on the context's tracker so `shutdown` waits for it.
    pub fn spawn<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tasks.spawn(task)
    }

    /// Cancels every invocation still waiting out its delay. Fan-outs that
    /// already started keep running.
    pub fn begin_shutdown(&self) {
        if !self.lifetime.is_cancelled() {
            tracing::info!("cancelling pending invocations");
            self.lifetime.cancel();
        }
    }

    /// Cancels pending invocations, waits for committed fan-outs to finish,
    /// then releases the directory client.
    pub async fn shutdown(&self) {
        self.begin_shutdown();
        self.tasks.close();
        self.tasks.wait().await;
        if let Some(Ok(directory)) = self.directory.get() {
            directory.close().await;
        }
        tracing::info!("execution context shut down");
    }
}
