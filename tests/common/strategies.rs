use proptest::prelude::*;
use recorder_workflow::state_machine::{TransactionStatus, WorkflowRole};
use std::collections::BTreeSet;

/// Strategy for picking any workflow status
pub fn status_strategy() -> impl Strategy<Value = TransactionStatus> {
    prop::sample::select(TransactionStatus::ALL.to_vec())
}

/// Strategy for picking any role
pub fn role_strategy() -> impl Strategy<Value = WorkflowRole> {
    prop::sample::select(WorkflowRole::ALL.to_vec())
}

/// Strategy for role sets, including users without any role
pub fn role_set_strategy() -> impl Strategy<Value = BTreeSet<WorkflowRole>> {
    prop::collection::btree_set(role_strategy(), 0..4)
}

/// Strategy for well-formed transaction UIDs
pub fn transaction_uid_strategy() -> impl Strategy<Value = String> {
    "TR-[0-9]{5}"
}

/// Strategy for selections of transactions in arbitrary statuses
pub fn selection_strategy() -> impl Strategy<Value = Vec<TransactionStatus>> {
    prop::collection::vec(status_strategy(), 1..6)
}
