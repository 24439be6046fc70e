use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors surfaced by the gateways, the add-plant flow and the HTTP layer.
///
/// Every variant maps to one HTTP status. The JSON body is always
/// `{"error": "<message>"}`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or malformed input, rejected before any upstream call. HTTP 400.
    #[error("{0}")]
    Validation(String),

    /// No owner principal on the request. HTTP 401.
    #[error("{0}")]
    Unauthorized(String),

    /// No species match or no plant record. HTTP 404.
    #[error("{0}")]
    NotFound(String),

    /// Network error or non-2xx response from Plant.id / Trefle. HTTP 500.
    #[error("{0}")]
    Upstream(String),

    /// Database or photo storage failure. HTTP 500.
    #[error("{0}")]
    Storage(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(_) | AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Upstream(e.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Storage(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
