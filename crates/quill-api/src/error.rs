//! Error taxonomy for the API layer and its mapping onto HTTP responses.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use quill_db::WriteError;
use quill_types::api::StatusResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed input or input that fails policy (e.g. credential lengths).
    #[error("{0}")]
    Invalid(String),

    /// Missing, malformed or expired token, or wrong credentials.
    #[error("authentication required")]
    Unauthenticated,

    /// Authenticated, but not the owner of the target.
    #[error("you can only modify your own articles")]
    Forbidden,

    #[error("{0}")]
    Conflict(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    /// The mutation queue is closed, or the caller gave up waiting on it.
    #[error("service unavailable, try again later")]
    Unavailable,

    /// Details are logged, never sent to the client.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Invalid(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<WriteError> for ApiError {
    fn from(err: WriteError) -> Self {
        match err {
            WriteError::Conflict => Self::Conflict("login is already taken".into()),
            WriteError::NotFound(what) => Self::NotFound(what),
            WriteError::Closed => Self::Unavailable,
            WriteError::WorkerLost | WriteError::Store(_) => Self::internal(err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Invalid(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Invalid(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Internal(detail) => {
                error!("Internal error: {}", detail);
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        (
            status,
            Json(StatusResponse {
                code: status.as_u16(),
                message,
            }),
        )
            .into_response()
    }
}
