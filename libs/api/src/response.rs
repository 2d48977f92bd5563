use std::collections::HashMap;

use axum::{http::StatusCode, response::IntoResponse, Json};
use once_cell::sync::Lazy;
use serde_json::json;
use tracing::error;

use crate::ApiError;

static ERROR_CODES: Lazy<HashMap<String, String>> = Lazy::new(|| {
    serde_json::from_str(include_str!("error-code.json")).unwrap_or_default()
});

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status_code, message) = match self {
            ApiError::AuthError(message) => (StatusCode::UNAUTHORIZED, message),
            ApiError::Forbidden(message) => (StatusCode::FORBIDDEN, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::ClientError(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::ValidationError(message) => {
                (StatusCode::UNPROCESSABLE_ENTITY, message)
            }
            ApiError::PayloadTooLarge(message) => {
                (StatusCode::PAYLOAD_TOO_LARGE, message)
            }
            ApiError::ServerError(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };

        (status_code, Json(json!({ "message": message }))).into_response()
    }
}

pub type ApiResponse<T> = Result<T, ApiError>;

pub trait IntoApiResponse<T> {
    fn into_response(self, error_code: &str) -> ApiResponse<T>;
}

impl<T> IntoApiResponse<T> for anyhow::Result<T> {
    fn into_response(self, error_code: &str) -> ApiResponse<T> {
        self.map_err(|e| {
            error!(code = error_code, error = format!("{:?}", e));

            let message = ERROR_CODES
                .get(error_code)
                .cloned()
                .unwrap_or_else(|| "Something went wrong.".to_string());

            match error_code.as_bytes().first() {
                Some(&b'4') => ApiError::ClientError(message),
                _ => ApiError::ServerError(message),
            }
        })
    }
}
