// src/errors.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("MongoDB error: {0}")]
    MongoDB(#[from] mongodb::error::Error),

    #[error("Match not found: {0}")]
    MatchNotFound(String),

    #[error("Match {0} is locked, predictions are closed")]
    MatchLocked(String),

    #[error("Prediction already exists for this match")]
    PredictionExists,

    #[error("Match with ID {0} already exists")]
    MatchExists(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::MongoDB(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string()),
            AppError::MatchNotFound(_) => (StatusCode::NOT_FOUND, "Match not found".to_string()),
            AppError::MatchLocked(_) => (StatusCode::LOCKED, "Match is locked".to_string()),
            AppError::PredictionExists => (StatusCode::CONFLICT, "Duplicate prediction".to_string()),
            AppError::MatchExists(_) => (StatusCode::CONFLICT, "Duplicate match".to_string()),
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "Validation failed".to_string()),
            AppError::UpstreamUnavailable(_) => (StatusCode::BAD_GATEWAY, "Upstream unavailable".to_string()),
            AppError::ConfigurationError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Configuration error".to_string()),
        };

        let body = Json(json!({
            "error": error_message,
            "message": self.to_string(),
            "success": false,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

// Manual From implementations
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::UpstreamUnavailable(format!("HTTP request failed: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ValidationError(format!("JSON parsing error: {}", err))
    }
}

// Helper conversion functions
impl AppError {
    pub fn not_found(match_id: impl Into<String>) -> Self {
        AppError::MatchNotFound(match_id.into())
    }

    pub fn locked(match_id: impl Into<String>) -> Self {
        AppError::MatchLocked(match_id.into())
    }

    pub fn invalid_data(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        AppError::UpstreamUnavailable(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        AppError::ConfigurationError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
