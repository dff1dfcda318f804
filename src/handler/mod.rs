pub mod broadcaster;
pub mod wait;

use tokio_util::sync::CancellationToken;

use crate::context::ExecutionContext;
use crate::error::HandlerError;
use crate::models::event::{EventKind, InboundEvent};
use broadcaster::BroadcastReport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Connected,
    Disconnected,
    Broadcast(BroadcastReport),
}

/// Dispatches one inbound event on its kind. An unknown kind is reported as
/// an error for this event only.
pub async fn route(
    ctx: &ExecutionContext,
    event: &InboundEvent,
    cancel: &CancellationToken,
) -> Result<EventOutcome, HandlerError> {
    let kind = EventKind::parse(&event.kind)
        .ok_or_else(|| HandlerError::UnrecognizedEventKind(event.kind.clone()))?;

    match kind {
        EventKind::Connect => {
            tracing::info!(connection_id = %event.connection_id, "connect");
            ctx.directory().await?.add(&event.connection_id).await?;
            Ok(EventOutcome::Connected)
        }
        EventKind::Disconnect => {
            tracing::info!(connection_id = %event.connection_id, "disconnect");
            ctx.directory()
                .await?
                .mark_closed(&event.connection_id)
                .await?;
            Ok(EventOutcome::Disconnected)
        }
        EventKind::Message => {
            tracing::info!(
                connection_id = %event.connection_id,
                body_len = event.body.len(),
                "message"
            );
            let directory = ctx.directory().await?;
            let transport = ctx.transport_for(&event.reply_context);
            let report = ctx
                .broadcaster()
                .handle(event, cancel, directory.as_ref(), transport.as_ref())
                .await?;
            Ok(EventOutcome::Broadcast(report))
        }
    }
}
