use crate::services::blob_service::BlobError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for general errors that keeps the message local.
///
/// Used by the object serving and health routes, which report status and
/// cause as JSON. The upload endpoint has its own opaque wrapper below.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<BlobError> for AppError {
    fn from(err: BlobError) -> Self {
        match err {
            BlobError::ObjectNotFound { .. } => AppError::not_found(err.to_string()),
            BlobError::InvalidObjectKey => AppError::not_found("object not found"),
            other => AppError::internal(other.to_string()),
        }
    }
}

/// Opaque failure for the upload endpoint.
///
/// The endpoint contract collapses every failure, whatever its kind, to a
/// bare empty 500: no internal detail leaks to the caller. The underlying
/// taxonomy is kept here so the cause still lands in the server log.
#[derive(Debug)]
pub struct UploadFailed(pub BlobError);

impl UploadFailed {
    /// The request carried no usable file payload.
    pub fn invalid_content(msg: impl Into<String>) -> Self {
        Self(BlobError::InvalidContent(msg.into()))
    }
}

impl From<BlobError> for UploadFailed {
    fn from(err: BlobError) -> Self {
        Self(err)
    }
}

impl IntoResponse for UploadFailed {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "upload request failed");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}
