use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{detect::DetectError, storage::StorageError};

/// Terminal outcome of a request. Variants map 1:1 onto HTTP statuses;
/// the failing pipeline stage is preserved in logs, not in the body.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("only image uploads are accepted")]
    UnsupportedMediaType,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("detection service unavailable")]
    DetectionUnavailable(#[source] DetectError),

    #[error("storage failure")]
    Storage(#[source] anyhow::Error),

    #[error("database failure")]
    Database(#[from] sqlx::Error),
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::UnsupportedMediaType => AppError::UnsupportedMediaType,
            StorageError::NotFound => AppError::NotFound("image"),
            other => AppError::Storage(other.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DetectionUnavailable(_) => StatusCode::BAD_GATEWAY,
            AppError::Storage(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        } else if let AppError::DetectionUnavailable(cause) = &self {
            tracing::error!(error = %cause, "detection stage failed");
        }

        (status, self.to_string()).into_response()
    }
}
