//! Error types for the PDF cutter server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pdfcutter_core::PdfCutterError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Pdf(#[from] PdfCutterError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upload is too large: {0}")]
    PayloadTooLarge(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::Pdf(err) => match err {
                PdfCutterError::InvalidSpecification(_)
                | PdfCutterError::OutOfRange(_)
                | PdfCutterError::EmptyResult(_) => StatusCode::BAD_REQUEST,
                PdfCutterError::LimitExceeded(_) => StatusCode::PAYLOAD_TOO_LARGE,
                PdfCutterError::SourceDocument { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                PdfCutterError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ServerError::Pdf(err) => err.code(),
            ServerError::InvalidRequest(_) => "INVALID_REQUEST",
            ServerError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ServerError::NotFound(_) => "NOT_FOUND",
            ServerError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", self);
            "An internal error occurred while processing the document".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: self.code().to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<axum::extract::multipart::MultipartError> for ServerError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServerError::PayloadTooLarge(err.body_text())
        } else {
            ServerError::InvalidRequest(format!("Malformed upload: {}", err.body_text()))
        }
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ServerError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServerError::Internal(format!("Worker task failed: {}", err))
    }
}
