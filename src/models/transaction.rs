//! # Transaction Model
//!
//! A filing submitted to the recorder office and its workflow history.
//!
//! ## Overview
//!
//! `Transaction` is the aggregate root of the workflow: it owns the ordered
//! list of `WorkflowTask` records that form its audit trail. The status of a
//! transaction is never stored on its own row; it is derived from the
//! `next_status` of the current (open) task.
//!
//! ## Database Schema
//!
//! Maps to `lrs_transactions` table:
//! ```sql
//! CREATE TABLE lrs_transactions (
//!   transaction_id BIGSERIAL PRIMARY KEY,
//!   transaction_uid VARCHAR(32) NOT NULL UNIQUE,
//!   transaction_type VARCHAR(128) NOT NULL,
//!   requested_by VARCHAR(256) NOT NULL,
//!   presentation_time TIMESTAMP,
//!   -- ... timestamps
//! );
//! ```

use super::workflow_task::{NewWorkflowTask, TaskLifecycleStatus, WorkflowTask, WorkflowTaskMode};
use crate::constants::events;
use crate::error::{RecorderError, Result};
use crate::state_machine::errors::{PersistenceError, PersistenceResult};
use crate::state_machine::states::TransactionStatus;
use crate::validation::validate_transaction_uid;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::fmt;

/// Public identifier of a transaction, as printed on the filing receipt
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionUid(String);

impl TransactionUid {
    /// Parse a user supplied UID. Surrounding whitespace is ignored and the
    /// value is upper-cased before validation.
    pub fn parse(value: &str) -> Result<Self> {
        let normalized = value.trim().to_ascii_uppercase();
        validate_transaction_uid(&normalized)?;
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for TransactionUid {
    type Err = RecorderError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: i64,
    pub uid: TransactionUid,
    pub transaction_type: String,
    pub requested_by: String,
    pub presentation_time: Option<NaiveDateTime>,
    /// Full history oldest first, including soft-deleted tasks
    pub tasks: Vec<WorkflowTask>,
}

/// A revert worked out from the loaded history
#[derive(Debug, Clone, PartialEq)]
pub struct RevertPlan {
    pub undone_task_id: i64,
    pub compensation: NewWorkflowTask,
}

/// Raw `lrs_transactions` row
#[derive(Debug, Clone, FromRow)]
pub struct TransactionRow {
    pub transaction_id: i64,
    pub transaction_uid: String,
    pub transaction_type: String,
    pub requested_by: String,
    pub presentation_time: Option<NaiveDateTime>,
}

impl Transaction {
    pub fn new(
        transaction_id: i64,
        uid: TransactionUid,
        transaction_type: impl Into<String>,
        requested_by: impl Into<String>,
    ) -> Self {
        Self {
            transaction_id,
            uid,
            transaction_type: transaction_type.into(),
            requested_by: requested_by.into(),
            presentation_time: None,
            tasks: Vec::new(),
        }
    }

    pub fn uid(&self) -> &TransactionUid {
        &self.uid
    }

    /// Tasks that are part of the history chain, oldest first
    pub fn active_tasks(&self) -> impl Iterator<Item = &WorkflowTask> {
        self.tasks.iter().filter(|task| task.is_active())
    }

    /// The open task, if the transaction has any history
    pub fn current_task(&self) -> Option<&WorkflowTask> {
        self.active_tasks().filter(|task| task.is_open()).last()
    }

    fn current_task_mut(&mut self) -> Option<&mut WorkflowTask> {
        self.tasks
            .iter_mut()
            .filter(|task| task.is_active() && task.is_open())
            .last()
    }

    /// Status derived from the current task; transactions without history are
    /// waiting for payment
    pub fn current_status(&self) -> TransactionStatus {
        self.current_task()
            .map(|task| task.next_status)
            .unwrap_or_default()
    }

    /// Append a new task, closing the current one.
    pub fn append_task(
        &mut self,
        task_id: i64,
        new_task: NewWorkflowTask,
        at: NaiveDateTime,
    ) -> Result<WorkflowTask> {
        let current_status = self.current_status();
        if new_task.current_status != current_status {
            return Err(RecorderError::StateTransitionError(format!(
                "Transaction {} is in status {current_status}, not {}",
                self.uid, new_task.current_status
            )));
        }

        let previous_task_id = match self.current_task_mut() {
            Some(previous) => {
                previous.close(task_id, at)?;
                Some(previous.task_id)
            }
            None => None,
        };

        let task = WorkflowTask::from_new(
            task_id,
            self.transaction_id,
            previous_task_id,
            new_task,
            at,
        );
        self.tasks.push(task.clone());
        Ok(task)
    }

    fn task(&self, task_id: i64) -> Option<&WorkflowTask> {
        self.tasks.iter().find(|task| task.task_id == task_id)
    }

    /// The step a revert would undo: the latest active task that is neither
    /// the initial task nor itself a revert.
    pub fn revertible_task(&self) -> Option<&WorkflowTask> {
        self.tasks
            .iter()
            .filter(|task| {
                task.is_active()
                    && task.previous_task_id.is_some()
                    && task.event_name != events::TRANSACTION_REVERTED
            })
            .max_by_key(|task| task.task_id)
    }

    /// Work out the compensating task that undoes the last revertible step.
    ///
    /// The compensation moves the transaction from its current status back to
    /// the status the undone step started in, and hands it back to whoever was
    /// responsible before that step.
    pub fn plan_revert(&self, reverted_by: i64) -> Result<RevertPlan> {
        let undone = self.revertible_task().ok_or_else(|| {
            RecorderError::StateTransitionError(format!(
                "Transaction {} has no step that can be reverted",
                self.uid
            ))
        })?;

        let current_status = self.current_status();
        if current_status != undone.next_status {
            return Err(RecorderError::HistoryIntegrityError(format!(
                "Transaction {} is in status {current_status} but task {} ended in {}",
                self.uid, undone.task_id, undone.next_status
            )));
        }

        let restored = undone
            .previous_task_id
            .and_then(|task_id| self.task(task_id))
            .ok_or_else(|| {
                RecorderError::HistoryIntegrityError(format!(
                    "Predecessor of task {} in transaction {} is missing",
                    undone.task_id, self.uid
                ))
            })?;

        Ok(RevertPlan {
            undone_task_id: undone.task_id,
            compensation: NewWorkflowTask {
                event_name: events::TRANSACTION_REVERTED.to_string(),
                mode: WorkflowTaskMode::Manual,
                assigned_by_id: reverted_by,
                responsible_id: restored.responsible_id,
                next_contact_id: restored.next_contact_id,
                current_status,
                next_status: undone.current_status,
                notes: format!("Reverted task {}", undone.task_id),
            },
        })
    }

    /// Undo the last revertible step by appending its compensating task and
    /// flagging the undone task as deleted.
    pub fn revert_last_step(
        &mut self,
        task_id: i64,
        reverted_by: i64,
        at: NaiveDateTime,
    ) -> Result<WorkflowTask> {
        let plan = self.plan_revert(reverted_by)?;
        let task = self.append_task(task_id, plan.compensation, at)?;
        if let Some(undone) = self
            .tasks
            .iter_mut()
            .find(|task| task.task_id == plan.undone_task_id)
        {
            undone.lifecycle_status = TaskLifecycleStatus::Deleted;
        }
        Ok(task)
    }

    /// Check that the history forms a single consistent chain.
    ///
    /// The chain is followed through its links, so the order of `tasks` does
    /// not matter. Deleted tasks stay part of the chain.
    pub fn validate_history(&self) -> Result<()> {
        let integrity = |msg: String| RecorderError::HistoryIntegrityError(msg);
        if self.tasks.is_empty() {
            return Ok(());
        }

        let mut roots = self.tasks.iter().filter(|task| task.previous_task_id.is_none());
        let (Some(mut current), None) = (roots.next(), roots.next()) else {
            return Err(integrity(format!(
                "Transaction {} does not have exactly one initial task",
                self.uid
            )));
        };

        let mut visited = 1;
        while let Some(next_id) = current.next_task_id {
            let next = self.task(next_id).ok_or_else(|| {
                integrity(format!(
                    "Task {} of transaction {} points to missing task {next_id}",
                    current.task_id, self.uid
                ))
            })?;
            if next.previous_task_id != Some(current.task_id) {
                return Err(integrity(format!(
                    "Tasks {} and {} of transaction {} are not linked",
                    current.task_id, next.task_id, self.uid
                )));
            }
            if next.current_status != current.next_status {
                return Err(integrity(format!(
                    "Task {} starts in {} but task {} ended in {}",
                    next.task_id, next.current_status, current.task_id, current.next_status
                )));
            }
            visited += 1;
            if visited > self.tasks.len() {
                return Err(integrity(format!(
                    "Workflow history of transaction {} loops",
                    self.uid
                )));
            }
            current = next;
        }

        if visited != self.tasks.len() {
            return Err(integrity(format!(
                "Transaction {} has {} tasks outside its history chain",
                self.uid,
                self.tasks.len() - visited
            )));
        }
        if !current.is_active() {
            return Err(integrity(format!(
                "Current task {} of transaction {} is deleted",
                current.task_id, self.uid
            )));
        }

        Ok(())
    }

    /// Load a transaction and its history by UID.
    pub async fn find_by_uid(
        pool: &PgPool,
        uid: &TransactionUid,
    ) -> PersistenceResult<Option<Transaction>> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT transaction_id, transaction_uid, transaction_type, requested_by, presentation_time
            FROM lrs_transactions
            WHERE transaction_uid = $1
            "#,
        )
        .bind(uid.as_str())
        .fetch_optional(pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let tasks = WorkflowTask::find_by_transaction(pool, row.transaction_id).await?;
        let uid = TransactionUid::parse(&row.transaction_uid).map_err(|_| {
            PersistenceError::InvalidStoredData {
                field: "transaction_uid".to_string(),
                value: row.transaction_uid.clone(),
            }
        })?;

        Ok(Some(Transaction {
            transaction_id: row.transaction_id,
            uid,
            transaction_type: row.transaction_type,
            requested_by: row.requested_by,
            presentation_time: row.presentation_time,
            tasks,
        }))
    }
}
