//! Error types for the recorder workflow.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecorderError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("State transition error: {0}")]
    StateTransitionError(String),
    #[error("History integrity error: {0}")]
    HistoryIntegrityError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("State machine guard error: {0}")]
    StateMachineGuardError(String),
    #[error("State machine persistence error: {0}")]
    StateMachinePersistenceError(String),
}

impl RecorderError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationError(_))
    }
}

impl From<serde_json::Error> for RecorderError {
    fn from(error: serde_json::Error) -> Self {
        RecorderError::ValidationError(format!("JSON serialization error: {error}"))
    }
}

impl From<sqlx::Error> for RecorderError {
    fn from(err: sqlx::Error) -> Self {
        RecorderError::DatabaseError(err.to_string())
    }
}

impl From<crate::config::ConfigurationError> for RecorderError {
    fn from(err: crate::config::ConfigurationError) -> Self {
        RecorderError::ConfigurationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RecorderError>;
