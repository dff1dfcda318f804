use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// The connection directory could not be reached or rejected a write.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A single recipient could not be reached. Never aborts a broadcast.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("connection is gone")]
    Gone,
    #[error("delivery rejected with status {0}")]
    Rejected(reqwest::StatusCode),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid delivery endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("socket channel closed")]
    ChannelClosed,
}

/// Failure outcome of handling one inbound event.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error("invocation cancelled before delivery")]
    Cancelled,
    #[error("unrecognized event kind `{0}`")]
    UnrecognizedEventKind(String),
    #[error("execution context unavailable: {0}")]
    ContextUnavailable(String),
    #[error("handler task failed: {0}")]
    TaskFailed(String),
}

impl HandlerError {
    fn code(&self) -> &'static str {
        match self {
            HandlerError::Directory(_) => "directory_error",
            HandlerError::Cancelled => "cancelled",
            HandlerError::UnrecognizedEventKind(_) => "unrecognized_event_kind",
            HandlerError::ContextUnavailable(_) => "context_unavailable",
            HandlerError::TaskFailed(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::UnrecognizedEventKind(_) => StatusCode::BAD_REQUEST,
            HandlerError::Directory(_)
            | HandlerError::Cancelled
            | HandlerError::ContextUnavailable(_)
            | HandlerError::TaskFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            HandlerError::UnrecognizedEventKind(_) | HandlerError::Cancelled => {
                tracing::warn!("event failed: {self}");
            }
            _ => tracing::error!("event failed: {self}"),
        }
        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.to_string()
            }
        });
        (status, Json(body)).into_response()
    }
}
