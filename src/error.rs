use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// ConsoleError
///
/// Failure taxonomy for the console core. Guard-facing code never lets these escape to the
/// user: a failed profile fetch becomes a redirect, a missing token becomes a redirect.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// The upstream rejected the token (401/403) or no token was presented.
    #[error("unauthorized")]
    Unauthorized,
    #[error("upstream error: {0}")]
    Upstream(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IntoResponse for ConsoleError {
    fn into_response(self) -> Response {
        let status = match &self {
            ConsoleError::Unauthorized => StatusCode::UNAUTHORIZED,
            ConsoleError::Upstream(_) | ConsoleError::Http(_) => StatusCode::BAD_GATEWAY,
            ConsoleError::Storage(_) | ConsoleError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
