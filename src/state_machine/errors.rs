use crate::error::RecorderError;
use thiserror::Error;

/// Error types for executing workflow commands
#[derive(Error, Debug)]
pub enum StateMachineError {
    #[error("Guard condition failed: {0}")]
    GuardFailed(#[from] GuardError),

    #[error("Persistence operation failed: {0}")]
    PersistenceFailed(#[from] PersistenceError),
}

/// Guard condition failures raised before a command executes
#[derive(Error, Debug)]
pub enum GuardError {
    #[error("Business rule violation: {rule}")]
    BusinessRuleViolation { rule: String },

    #[error("Command {command} is not applicable in status {status}")]
    CommandNotApplicable { command: String, status: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid state for guard check: {state}")]
    InvalidState { state: String },
}

/// Failures reading or writing workflow history
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Failed to save workflow task: {reason}")]
    TaskSaveFailed { reason: String },

    #[error("Transaction not found: {uid}")]
    TransactionNotFound { uid: String },

    #[error("No revertible workflow task for transaction {transaction_id}")]
    NothingToRevert { transaction_id: i64 },

    #[error("Concurrent modification detected for transaction {transaction_id}")]
    ConcurrentModification { transaction_id: i64 },

    #[error("Workflow history of transaction {transaction_id} is inconsistent: {reason}")]
    HistoryIntegrity { transaction_id: i64, reason: String },

    #[error("Invalid stored data in {field}: {value}")]
    InvalidStoredData { field: String, value: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;
pub type GuardResult<T> = Result<T, GuardError>;
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Helper function to create business rule violations
pub fn business_rule_violation(rule: impl Into<String>) -> GuardError {
    GuardError::BusinessRuleViolation { rule: rule.into() }
}

/// Classify why a revert could not be planned from the loaded history
pub fn revert_failure(transaction_id: i64, err: RecorderError) -> PersistenceError {
    match err {
        RecorderError::HistoryIntegrityError(reason) => PersistenceError::HistoryIntegrity {
            transaction_id,
            reason,
        },
        RecorderError::StateTransitionError(_) => PersistenceError::NothingToRevert { transaction_id },
        other => PersistenceError::TaskSaveFailed {
            reason: other.to_string(),
        },
    }
}

impl From<StateMachineError> for RecorderError {
    fn from(err: StateMachineError) -> Self {
        match err {
            StateMachineError::GuardFailed(guard) => guard.into(),
            StateMachineError::PersistenceFailed(persistence) => persistence.into(),
        }
    }
}

impl From<GuardError> for RecorderError {
    fn from(err: GuardError) -> Self {
        match err {
            GuardError::MissingField { .. } => RecorderError::ValidationError(err.to_string()),
            other => RecorderError::StateMachineGuardError(format!("{other}")),
        }
    }
}

impl From<PersistenceError> for RecorderError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::TransactionNotFound { .. } => {
                RecorderError::NotFound(err.to_string())
            }
            PersistenceError::HistoryIntegrity { .. } => {
                RecorderError::HistoryIntegrityError(err.to_string())
            }
            other => RecorderError::StateMachinePersistenceError(format!("{other}")),
        }
    }
}
