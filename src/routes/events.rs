use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::error::HandlerError;
use crate::models::event::InboundEvent;
use crate::state::AppState;

/// Handles one inbound event. Only the status code is meaningful to callers.
pub async fn handle_event(
    State(state): State<AppState>,
    Json(event): Json<InboundEvent>,
) -> Result<StatusCode, HandlerError> {
    state.context.invoke(event).await?;
    Ok(StatusCode::OK)
}
