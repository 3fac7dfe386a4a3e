//! Input validation for the workflow use cases
//!
//! Everything a caller hands to the use-case layer is checked here before it
//! reaches the rules table or the database.

use crate::constants::{
    MAX_TASK_NOTES_LENGTH, MAX_TRANSACTION_UID_LENGTH, MIN_TRANSACTION_UID_LENGTH,
};
use crate::error::{RecorderError, Result};

/// Validates the shape of a normalized transaction UID
pub fn validate_transaction_uid(uid: &str) -> Result<()> {
    if uid.is_empty() {
        return Err(RecorderError::ValidationError(
            "Transaction UID is required".to_string(),
        ));
    }

    if uid.len() < MIN_TRANSACTION_UID_LENGTH || uid.len() > MAX_TRANSACTION_UID_LENGTH {
        return Err(RecorderError::ValidationError(format!(
            "Transaction UID '{uid}' must be between {MIN_TRANSACTION_UID_LENGTH} and {MAX_TRANSACTION_UID_LENGTH} characters"
        )));
    }

    if !uid
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(RecorderError::ValidationError(format!(
            "Transaction UID '{uid}' may only contain letters, digits and '-'"
        )));
    }

    if uid.starts_with('-') || uid.ends_with('-') {
        return Err(RecorderError::ValidationError(format!(
            "Transaction UID '{uid}' cannot start or end with '-'"
        )));
    }

    Ok(())
}

/// Validates the number of distinct transactions a command acts on: at least
/// one and at most `max_batch_size`
pub fn validate_uid_batch(count: usize, max_batch_size: usize) -> Result<()> {
    if count == 0 {
        return Err(RecorderError::ValidationError(
            "At least one transaction UID is required".to_string(),
        ));
    }
    validate_batch_size(count, max_batch_size)
}

pub fn validate_batch_size(len: usize, max_batch_size: usize) -> Result<()> {
    if len > max_batch_size {
        return Err(RecorderError::ValidationError(format!(
            "Too many transactions: {len} (max: {max_batch_size})"
        )));
    }
    Ok(())
}

/// Validates free-text notes attached to a workflow task
pub fn validate_notes(notes: &str) -> Result<()> {
    if notes.chars().count() > MAX_TASK_NOTES_LENGTH {
        return Err(RecorderError::ValidationError(format!(
            "Notes too long: {} chars (max: {MAX_TASK_NOTES_LENGTH})",
            notes.chars().count()
        )));
    }

    if notes
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\r' && c != '\t')
    {
        return Err(RecorderError::ValidationError(
            "Notes contain control characters".to_string(),
        ));
    }

    Ok(())
}
