//! Error types for the application

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use inkmix_core::MixError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Mix(#[from] MixError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Mix computation exceeded {0:?}")]
    Timeout(Duration),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Mix(MixError::Cancelled) | AppError::Timeout(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Mix(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::warn!("Request failed: {}", self);
        }

        (status, self.to_string()).into_response()
    }
}
