//! Error types for chatrelay
//!
//! All errors implement `IntoResponse` for Axum handlers. Every error that
//! reaches the HTTP boundary becomes the same apology envelope with a 500
//! status. Callers log the detail before returning the error.

use crate::handlers::chat::ChatResponse;
use crate::provider::ProviderError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file {path}: {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in {path}: {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Missing API key: set {variable} in the environment or a .env file")]
    MissingCredential { variable: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Completion provider failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for errors that can only occur before the server accepts requests
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::ConfigFileRead { .. }
                | Self::ConfigParseFailed { .. }
                | Self::ConfigValidationFailed { .. }
                | Self::MissingCredential { .. }
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ChatResponse::apology()),
        )
            .into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;
