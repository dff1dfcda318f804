use futures_util::future::join_all;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::wait::{wait_or_cancel, WaitOutcome};
use crate::directory::ConnectionDirectory;
use crate::error::HandlerError;
use crate::models::event::InboundEvent;
use crate::transport::TransportSender;

pub const REPLY_PREFIX: &str = "Echo me: ";

/// The reply fanned out for a message body.
pub fn reply_for(body: &str) -> String {
    format!("{REPLY_PREFIX}{body}")
}

/// A body that parses as an integer asks for that many seconds of delay.
/// Anything else, and any negative number, means no delay.
pub fn delay_for(body: &str) -> Duration {
    body.parse::<i64>()
        .ok()
        .and_then(|secs| u64::try_from(secs).ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::ZERO)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub recipients: usize,
    pub delivered: usize,
    pub failed: Vec<String>,
}

/// Computes the echo reply, waits the requested delay unless cancelled, then
/// delivers to every connection the directory reports as active.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    max_delay: Option<Duration>,
}

impl Broadcaster {
    pub fn new(max_delay: Option<Duration>) -> Self {
        Self { max_delay }
    }

    pub fn effective_delay(&self, body: &str) -> Duration {
        let requested = delay_for(body);
        match self.max_delay {
            Some(max) if requested > max => {
                tracing::warn!(
                    requested_secs = requested.as_secs(),
                    max_secs = max.as_secs(),
                    "requested delay exceeds ceiling, clamping"
                );
                max
            }
            _ => requested,
        }
    }

    pub async fn handle(
        &self,
        event: &InboundEvent,
        cancel: &CancellationToken,
        directory: &dyn ConnectionDirectory,
        transport: &dyn TransportSender,
    ) -> Result<BroadcastReport, HandlerError> {
        let reply = reply_for(&event.body);
        let delay = self.effective_delay(&event.body);
        tracing::debug!(
            connection_id = %event.connection_id,
            delay_secs = delay.as_secs(),
            "waiting before broadcast"
        );

        if wait_or_cancel(delay, cancel).await == WaitOutcome::Cancelled {
            tracing::info!(connection_id = %event.connection_id, "request cancelled");
            return Err(HandlerError::Cancelled);
        }

        // Committed: from here the full fan-out runs even if cancellation fires.
        let recipients = directory.list_active().await?;

        let attempts = recipients.iter().map(|id| {
            let data = reply.as_bytes();
            async move { (id, transport.send(id, data).await) }
        });

        let mut report = BroadcastReport {
            recipients: recipients.len(),
            ..BroadcastReport::default()
        };
        for (id, result) in join_all(attempts).await {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::error!(connection_id = %id, "failed to deliver message: {e}");
                    report.failed.push(id.clone());
                }
            }
        }

        tracing::info!(
            recipients = report.recipients,
            delivered = report.delivered,
            failed = report.failed.len(),
            "broadcast complete"
        );
        Ok(report)
    }
}
