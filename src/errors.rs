use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("internal error: {0}")]
    Internal(anyhow::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    /// The request is well-formed but a booking policy rejects it (booking
    /// disabled, outside the notice/advance window, location closed, blocked
    /// period). Callers are expected to re-query availability.
    #[error("{0}")]
    PolicyViolation(String),

    /// The slot is at capacity or a concurrent writer got there first.
    #[error("{0}")]
    Conflict(String),

    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("booking code generation exhausted its retry limit")]
    GenerationExhausted,

    #[error("unauthorized")]
    Unauthorized,
}

impl From<anyhow::Error> for EngineError {
    fn from(e: anyhow::Error) -> Self {
        EngineError::Internal(e)
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = match &self {
            EngineError::Database(e) => {
                tracing::error!("database error: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            EngineError::Internal(e) => {
                tracing::error!("internal error: {e:#}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::BadRequest(_) => StatusCode::BAD_REQUEST,
            EngineError::PolicyViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::Conflict(_) => StatusCode::CONFLICT,
            EngineError::InvalidStateTransition { from, to } => {
                tracing::error!("rejected state transition from {from} to {to}");
                StatusCode::CONFLICT
            }
            EngineError::GenerationExhausted => {
                tracing::error!("booking code generation exhausted its retry limit");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            EngineError::Unauthorized => StatusCode::UNAUTHORIZED,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
