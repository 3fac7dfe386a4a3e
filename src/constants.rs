//! # System Constants
//!
//! Storage codes, event identifiers and limits shared across the workflow.

/// Party id used for tasks created by the system rather than a person
pub const NO_PARTY_ID: i64 = -1;

/// `lrs_workflow_tasks.task_status` codes
pub const TASK_STATUS_ACTIVE: char = 'A';
pub const TASK_STATUS_DELETED: char = 'X';

/// Transaction UIDs are short uppercase identifiers such as `TR-ZS-73RD6-9AE45`
pub const MIN_TRANSACTION_UID_LENGTH: usize = 5;
pub const MAX_TRANSACTION_UID_LENGTH: usize = 32;

/// Maximum length of the free-text notes stored on a workflow task
pub const MAX_TASK_NOTES_LENGTH: usize = 2048;

/// Event identifiers recorded on workflow tasks that do not come from a command.
/// Command-driven tasks use `workflow.<command name>`.
pub mod events {
    pub const TRANSACTION_CREATED: &str = "transaction.created";
    pub const TRANSACTION_REVERTED: &str = "transaction.reverted";
}

/// Components named in structured log records
pub mod components {
    pub const RULES: &str = "workflow_rules";
    pub const AGGREGATOR: &str = "commands_aggregator";
    pub const USE_CASES: &str = "workflow_use_cases";
    pub const STORE: &str = "transaction_store";
}
