//! HTTP mapping for [`LoadLabError`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use loadlab_core::error::{ClientCode, LoadLabError};

/// Error returned from handlers; renders as `{code, message}` JSON.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    err: LoadLabError,
}

impl ApiError {
    pub fn new(status: StatusCode, err: LoadLabError) -> Self {
        Self { status, err }
    }

    /// Generic 500 used when a handler terminates abnormally.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, LoadLabError::Internal(msg.into()))
    }
}

impl From<LoadLabError> for ApiError {
    fn from(err: LoadLabError) -> Self {
        let status = match err.client_code() {
            ClientCode::BadRequest => StatusCode::BAD_REQUEST,
            ClientCode::Store => StatusCode::SERVICE_UNAVAILABLE,
            ClientCode::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ClientCode::Config | ClientCode::Registration | ClientCode::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "code": self.err.client_code().as_str(),
            "message": self.err.to_string(),
        });
        (self.status, Json(body)).into_response()
    }
}
