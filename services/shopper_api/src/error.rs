use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use quote_engine::repository::InvalidOrderId;
use quote_engine::{EditError, MessageError, RepositoryError, SessionError, StateError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no images received")]
    NoImages,
    #[error("no image saved")]
    NothingSaved { skipped: Vec<String> },
    #[error("image too large (max {} MB)", .limit / (1024 * 1024))]
    ImageTooLarge { name: String, limit: usize },
    #[error("malformed upload: {0}")]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    InvalidId(#[from] InvalidOrderId),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Message(#[from] MessageError),
    #[error(transparent)]
    CorruptState(#[from] StateError),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Storage(err.to_string())
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Corrupt(e) => ApiError::CorruptState(e),
            RepositoryError::Io(e) => e.into(),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Edit(e) => e.into(),
            SessionError::Repository(e) => e.into(),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoImages
            | ApiError::NothingSaved { .. }
            | ApiError::Multipart(_)
            | ApiError::InvalidId(_)
            | ApiError::Message(_) => StatusCode::BAD_REQUEST,
            ApiError::ImageTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound(_) | ApiError::Edit(_) => StatusCode::NOT_FOUND,
            ApiError::CorruptState(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Storage(detail) => {
                tracing::error!(target = "shopper", "storage error: {}", detail);
                json!({ "error": "server error" })
            }
            ApiError::NothingSaved { skipped } => json!({ "error": self.to_string(), "skipped": skipped }),
            ApiError::ImageTooLarge { name, .. } => {
                tracing::warn!(target = "shopper", file = %name, "upload rejected: image too large");
                json!({ "error": self.to_string() })
            }
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
