//! HTTP mapping of service errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use healthvault_core::CoreError;
use healthvault_files::FilesError;
use serde_json::json;

/// Error leaving the REST boundary. Every 4xx carries a human-readable
/// `detail`; 5xx responses log the cause and expose nothing.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self { status, detail: detail.into() }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let status = match &err {
            CoreError::InvalidInput(_) | CoreError::ExpiredCode | CoreError::InvalidCode => {
                StatusCode::BAD_REQUEST
            }
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
            CoreError::Conflict(_) => StatusCode::CONFLICT,
            CoreError::Database(_) | CoreError::Internal(_) => {
                tracing::error!("internal error: {err}");
                return Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal error.");
            }
        };
        Self::new(status, err.to_string())
    }
}

impl From<FilesError> for ApiError {
    fn from(err: FilesError) -> Self {
        match &err {
            FilesError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "File not found."),
            FilesError::InvalidKey(_) => Self::bad_request("Invalid file key."),
            FilesError::InvalidRootDirectory(_) | FilesError::Io(_) => {
                tracing::error!("file store error: {err}");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal error.")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_variants_map_onto_statuses() {
        let cases = [
            (CoreError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (CoreError::ExpiredCode, StatusCode::BAD_REQUEST),
            (CoreError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (CoreError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (CoreError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (CoreError::Conflict("x".into()), StatusCode::CONFLICT),
            (CoreError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn internal_errors_hide_their_detail() {
        let err = ApiError::from(CoreError::Internal("secret path /x".into()));
        assert_eq!(err.detail, "Internal error.");
    }
}
