//! Built-in WebSocket transport.
//!
//! Each socket becomes a connection: opening it produces a `connect` event,
//! every text frame a `message` event, and closing it a `disconnect` event.
//! Replies reach the socket through the context's [`SocketHub`].
//!
//! [`SocketHub`]: crate::transport::hub::SocketHub

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::header::HOST;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::config::TransportMode;
use crate::context::ExecutionContext;
use crate::models::event::{EventKind, InboundEvent, ReplyContext};
use crate::state::AppState;

pub async fn ws_upgrade(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    if state.context.config().transport != TransportMode::Local {
        return StatusCode::NOT_FOUND.into_response();
    }

    let domain = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost")
        .to_string();
    let reply_context = ReplyContext {
        domain,
        stage: state.context.config().stage.clone(),
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state.context, reply_context))
}

async fn handle_socket(socket: WebSocket, ctx: Arc<ExecutionContext>, reply_context: ReplyContext) {
    let (mut ws_sink, mut ws_stream) = socket.split();
    let connection_id = uuid::Uuid::new_v4().to_string();

    // Register before announcing the connection so no reply is missed.
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    ctx.hub().register(&connection_id, tx);

    let connect = InboundEvent::new(
        EventKind::Connect,
        &connection_id,
        String::new(),
        reply_context.clone(),
    );
    if let Err(e) = ctx.invoke(connect).await {
        tracing::error!(%connection_id, "rejecting socket, connect failed: {e}");
        ctx.hub().unregister(&connection_id);
        let _ = ws_sink.send(Message::Close(None)).await;
        return;
    }

    loop {
        tokio::select! {
            Some(msg) = rx.recv() => {
                if ws_sink.send(Message::Text(msg.into())).await.is_err() {
                    break;
                }
            }
            msg = ws_stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let event = InboundEvent::new(
                            EventKind::Message,
                            &connection_id,
                            text.as_str().to_owned(),
                            reply_context.clone(),
                        );
                        let invoker = Arc::clone(&ctx);
                        ctx.spawn(async move {
                            if let Err(e) = invoker.invoke(event).await {
                                tracing::warn!("message handling failed: {e}");
                            }
                        });
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(%connection_id, "socket error: {e}");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    ctx.hub().unregister(&connection_id);
    let disconnect = InboundEvent::new(
        EventKind::Disconnect,
        &connection_id,
        String::new(),
        reply_context,
    );
    if let Err(e) = ctx.invoke(disconnect).await {
        tracing::error!(%connection_id, "disconnect failed: {e}");
    }
}
