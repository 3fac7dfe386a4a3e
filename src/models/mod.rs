//! # Workflow Models
//!
//! Transactions, their workflow task history, and the requesting user.

pub mod transaction;
pub mod user;
pub mod workflow_task;

pub use transaction::{RevertPlan, Transaction, TransactionUid};
pub use user::WorkflowUser;
pub use workflow_task::{NewWorkflowTask, TaskLifecycleStatus, WorkflowTask, WorkflowTaskMode};
