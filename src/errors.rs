use crate::availability::Feed;
use axum::{Json, http::StatusCode};
use thiserror::Error;

/// Why a single request attempt did not produce a JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid JSON body: {0}")]
    Decode(String),
}

/// Every attempt at a request failed; carries the last cause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("GET {url} failed after {attempts} attempt(s): {cause}")]
pub struct RequestFailure {
    pub url: String,
    pub attempts: u32,
    #[source]
    pub cause: AttemptError,
}

/// A calendar session could not load one of its feeds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{feed} unavailable: {failure}")]
pub struct InitializationFailure {
    pub feed: Feed,
    #[source]
    pub failure: RequestFailure,
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }
}

impl From<InitializationFailure> for AppError {
    fn from(err: InitializationFailure) -> Self {
        Self::bad_gateway(err.to_string())
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}
