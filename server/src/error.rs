use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::stores::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid word")]
    InvalidWord,

    #[error("not found")]
    NotFound,

    #[error("no word available")]
    NoWordAvailable,

    #[error("malformed payload")]
    MalformedPayload,

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::InvalidWord => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound | AppError::NoWordAvailable => StatusCode::NOT_FOUND,
            AppError::MalformedPayload => StatusCode::BAD_REQUEST,
            AppError::StorageUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        };

        (status, self.to_string()).into_response()
    }
}
