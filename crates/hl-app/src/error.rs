//! Error types for the hl-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the backend crates and gives
/// front ends a single error surface.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Project validation failed: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Calculation failed: {0}")]
    Calculation(String),

    #[error("System not found: {0}")]
    SystemNotFound(String),

    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("No {entity_type} '{id}' in this result")]
    EntityNotFound { entity_type: String, id: String },

    #[error("Results error: {0}")]
    Results(String),

    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for hl-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<hl_project::ProjectError> for AppError {
    fn from(err: hl_project::ProjectError) -> Self {
        match err {
            hl_project::ProjectError::Validation(e) => AppError::Validation(e.to_string()),
            other => AppError::Project(other.to_string()),
        }
    }
}

impl From<hl_project::ValidationError> for AppError {
    fn from(err: hl_project::ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<hl_calc::ConfigError> for AppError {
    fn from(err: hl_calc::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<hl_calc::CalcError> for AppError {
    fn from(err: hl_calc::CalcError) -> Self {
        match err {
            hl_calc::CalcError::Config(e) => e.into(),
            other => AppError::Calculation(other.to_string()),
        }
    }
}

impl From<hl_results::ResultsError> for AppError {
    fn from(err: hl_results::ResultsError) -> Self {
        match err {
            hl_results::ResultsError::RunNotFound { run_id } => AppError::RunNotFound(run_id),
            other => AppError::Results(other.to_string()),
        }
    }
}
