//! Error handling for the farm stock client

use shared::{ItemId, PlanError};
use thiserror::Error;

/// Client error types
#[derive(Error, Debug)]
pub enum AppError {
    // Input errors
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Engine errors
    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    #[error("Nothing to commit: {0}")]
    NothingToCommit(String),

    #[error("Stock shortage not confirmed for material {material_id}")]
    ShortageDeclined { material_id: ItemId },

    // Backend errors
    #[error("Gateway rejected the request: {0}")]
    Gateway(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),
}

impl AppError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Plan(_) => "PLAN_ERROR",
            AppError::NothingToCommit(_) => "NOTHING_TO_COMMIT",
            AppError::ShortageDeclined { .. } => "SHORTAGE_DECLINED",
            AppError::Gateway(_) => "GATEWAY_ERROR",
            AppError::Http(_) => "HTTP_ERROR",
            AppError::Json(_) => "INVALID_RESPONSE",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }
}

impl From<&'static str> for AppError {
    fn from(message: &'static str) -> Self {
        AppError::Validation(message.to_string())
    }
}

/// Result type alias for client operations
pub type AppResult<T> = Result<T, AppError>;
