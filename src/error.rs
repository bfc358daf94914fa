use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Message returned to callers for any upstream failure. Details stay in the logs.
const GENERIC_UPSTREAM_MESSAGE: &str = "Internal server error";

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Rate limit store error: {0}")]
    RateLimitStore(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Rate limit exceeded")]
    RateLimited { retry_after_secs: u64 },

    #[error("Upstream credential missing: {0}")]
    MissingCredential(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::RateLimited { retry_after_secs } => {
                let body = Json(json!({
                    "error": "Rate limit exceeded. Please wait a minute."
                }));
                return (
                    StatusCode::TOO_MANY_REQUESTS,
                    [(header::RETRY_AFTER, retry_after_secs.to_string())],
                    body,
                )
                    .into_response();
            }
            AppError::MissingCredential(what) => {
                tracing::error!(reason = "missing_credential", credential = %what, "Upstream credential not configured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "API key not configured".to_string(),
                )
            }
            AppError::HttpClient(_) | AppError::ExternalApi(_) | AppError::Json(_) => {
                tracing::error!(reason = "upstream_failure", error = %self, "Upstream call failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    GENERIC_UPSTREAM_MESSAGE.to_string(),
                )
            }
            AppError::RateLimitStore(_) | AppError::Catalog(_) | AppError::Internal(_) => {
                tracing::error!(reason = "internal", error = %self, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
