//! # Workflow Task Model
//!
//! One recorded step in a transaction's processing history.
//!
//! ## Overview
//!
//! A `WorkflowTask` is created every time a transaction changes status. It
//! records the status before (`current_status`) and after (`next_status`) the
//! step, who assigned it, who is responsible for it, and when it was checked in
//! and out. Tasks form a singly linked chain per transaction through
//! `previous_task_id` / `next_task_id`; the task without a successor is the
//! transaction's current task.
//!
//! ## Lifecycle
//!
//! - **Open**: the current task, `next_task_id` is `None`
//! - **Closed**: superseded by a newer task; its links and times never change
//! - **Deleted**: a step undone by a later `transaction.reverted` task. The
//!   row keeps its place in the chain and is only flagged `X`
//!
//! ## Database Schema
//!
//! Maps to `lrs_workflow_tasks` table:
//! ```sql
//! CREATE TABLE lrs_workflow_tasks (
//!   task_id BIGSERIAL PRIMARY KEY,
//!   transaction_id BIGINT NOT NULL,
//!   event_name VARCHAR(64) NOT NULL,
//!   mode CHAR(1) NOT NULL,
//!   current_status CHAR(1) NOT NULL,
//!   next_status CHAR(1) NOT NULL,
//!   previous_task_id BIGINT,
//!   next_task_id BIGINT,
//!   task_status CHAR(1) NOT NULL DEFAULT 'A',
//!   -- ... parties, timestamps, notes
//! );
//! ```

use super::transaction::Transaction;
use crate::constants::{NO_PARTY_ID, TASK_STATUS_ACTIVE, TASK_STATUS_DELETED};
use crate::error::{RecorderError, Result};
use crate::state_machine::errors::{revert_failure, PersistenceError, PersistenceResult};
use crate::state_machine::states::TransactionStatus;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};

/// How the task came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowTaskMode {
    Automatic,
    Manual,
}

impl WorkflowTaskMode {
    pub fn code(&self) -> char {
        match self {
            Self::Automatic => 'A',
            Self::Manual => 'M',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'A' => Some(Self::Automatic),
            'M' => Some(Self::Manual),
            _ => None,
        }
    }
}

/// Soft-delete flag on a task row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskLifecycleStatus {
    Active,
    Deleted,
}

impl TaskLifecycleStatus {
    pub fn code(&self) -> char {
        match self {
            Self::Active => TASK_STATUS_ACTIVE,
            Self::Deleted => TASK_STATUS_DELETED,
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            TASK_STATUS_ACTIVE => Some(Self::Active),
            TASK_STATUS_DELETED => Some(Self::Deleted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowTask {
    pub task_id: i64,
    pub transaction_id: i64,
    pub event_name: String,
    pub mode: WorkflowTaskMode,
    pub assigned_by_id: i64,
    pub responsible_id: i64,
    pub next_contact_id: Option<i64>,
    pub current_status: TransactionStatus,
    pub next_status: TransactionStatus,
    pub check_in_time: NaiveDateTime,
    pub end_process_time: Option<NaiveDateTime>,
    pub check_out_time: Option<NaiveDateTime>,
    pub notes: String,
    pub previous_task_id: Option<i64>,
    pub next_task_id: Option<i64>,
    pub lifecycle_status: TaskLifecycleStatus,
}

/// New WorkflowTask for creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWorkflowTask {
    pub event_name: String,
    pub mode: WorkflowTaskMode,
    pub assigned_by_id: i64,
    pub responsible_id: i64,
    pub next_contact_id: Option<i64>,
    pub current_status: TransactionStatus,
    pub next_status: TransactionStatus,
    pub notes: String,
}

/// Raw `lrs_workflow_tasks` row
#[derive(Debug, Clone, FromRow)]
pub struct WorkflowTaskRow {
    pub task_id: i64,
    pub transaction_id: i64,
    pub event_name: String,
    pub mode: String,
    pub assigned_by_id: i64,
    pub responsible_id: i64,
    pub next_contact_id: Option<i64>,
    pub current_status: String,
    pub next_status: String,
    pub check_in_time: NaiveDateTime,
    pub end_process_time: Option<NaiveDateTime>,
    pub check_out_time: Option<NaiveDateTime>,
    pub notes: String,
    pub previous_task_id: Option<i64>,
    pub next_task_id: Option<i64>,
    pub task_status: String,
}

fn single_code(field: &str, value: &str) -> PersistenceResult<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(code), None) => Ok(code),
        _ => Err(PersistenceError::InvalidStoredData {
            field: field.to_string(),
            value: value.to_string(),
        }),
    }
}

fn decode<T>(field: &str, value: &str, from_code: impl Fn(char) -> Option<T>) -> PersistenceResult<T> {
    from_code(single_code(field, value)?).ok_or_else(|| PersistenceError::InvalidStoredData {
        field: field.to_string(),
        value: value.to_string(),
    })
}

impl TryFrom<WorkflowTaskRow> for WorkflowTask {
    type Error = PersistenceError;

    fn try_from(row: WorkflowTaskRow) -> PersistenceResult<Self> {
        Ok(Self {
            mode: decode("mode", &row.mode, WorkflowTaskMode::from_code)?,
            current_status: decode(
                "current_status",
                &row.current_status,
                TransactionStatus::from_code,
            )?,
            next_status: decode("next_status", &row.next_status, TransactionStatus::from_code)?,
            lifecycle_status: decode(
                "task_status",
                &row.task_status,
                TaskLifecycleStatus::from_code,
            )?,
            task_id: row.task_id,
            transaction_id: row.transaction_id,
            event_name: row.event_name,
            assigned_by_id: row.assigned_by_id,
            responsible_id: row.responsible_id,
            next_contact_id: row.next_contact_id,
            check_in_time: row.check_in_time,
            end_process_time: row.end_process_time,
            check_out_time: row.check_out_time,
            notes: row.notes,
            previous_task_id: row.previous_task_id,
            next_task_id: row.next_task_id,
        })
    }
}

const TASK_COLUMNS: &str = r#"
    task_id, transaction_id, event_name, mode, assigned_by_id, responsible_id,
    next_contact_id, current_status, next_status, check_in_time, end_process_time,
    check_out_time, notes, previous_task_id, next_task_id, task_status
"#;

impl WorkflowTask {
    /// Build the first task of a freshly created transaction
    pub fn initial(task_id: i64, transaction_id: i64, at: NaiveDateTime) -> Self {
        Self {
            task_id,
            transaction_id,
            event_name: crate::constants::events::TRANSACTION_CREATED.to_string(),
            mode: WorkflowTaskMode::Automatic,
            assigned_by_id: NO_PARTY_ID,
            responsible_id: NO_PARTY_ID,
            next_contact_id: None,
            current_status: TransactionStatus::Payment,
            next_status: TransactionStatus::Payment,
            check_in_time: at,
            end_process_time: None,
            check_out_time: None,
            notes: String::new(),
            previous_task_id: None,
            next_task_id: None,
            lifecycle_status: TaskLifecycleStatus::Active,
        }
    }

    pub fn from_new(
        task_id: i64,
        transaction_id: i64,
        previous_task_id: Option<i64>,
        new_task: NewWorkflowTask,
        at: NaiveDateTime,
    ) -> Self {
        Self {
            task_id,
            transaction_id,
            event_name: new_task.event_name,
            mode: new_task.mode,
            assigned_by_id: new_task.assigned_by_id,
            responsible_id: new_task.responsible_id,
            next_contact_id: new_task.next_contact_id,
            current_status: new_task.current_status,
            next_status: new_task.next_status,
            check_in_time: at,
            end_process_time: None,
            check_out_time: None,
            notes: new_task.notes,
            previous_task_id,
            next_task_id: None,
            lifecycle_status: TaskLifecycleStatus::Active,
        }
    }

    /// The task has not been superseded yet
    pub fn is_open(&self) -> bool {
        self.next_task_id.is_none()
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle_status == TaskLifecycleStatus::Active
    }

    /// Close this task in favor of `next_task_id`.
    ///
    /// Closed tasks are immutable; closing twice is an error.
    pub fn close(&mut self, next_task_id: i64, at: NaiveDateTime) -> Result<()> {
        if let Some(existing) = self.next_task_id {
            return Err(RecorderError::StateTransitionError(format!(
                "Workflow task {} is already closed by task {existing}",
                self.task_id
            )));
        }
        self.next_task_id = Some(next_task_id);
        self.end_process_time.get_or_insert(at);
        self.check_out_time = Some(at);
        Ok(())
    }

    /// Time the task was held, when it has been checked out
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        self.check_out_time.map(|out| out - self.check_in_time)
    }

    /// Refuse `new_task` unless it starts in the status the open task ended in.
    /// A transaction without an open task is waiting for payment.
    pub fn check_supersedes(
        open: Option<&WorkflowTask>,
        new_task: &NewWorkflowTask,
        transaction_id: i64,
    ) -> PersistenceResult<()> {
        let expected = open.map(|task| task.next_status).unwrap_or_default();
        if expected != new_task.current_status {
            return Err(PersistenceError::ConcurrentModification { transaction_id });
        }
        Ok(())
    }

    /// Load the full history of a transaction, oldest first.
    ///
    /// Rows are ordered by `task_id`: appends are serialized per transaction
    /// by the lock on the open task, so ids follow the chain.
    pub async fn find_by_transaction(
        pool: &PgPool,
        transaction_id: i64,
    ) -> PersistenceResult<Vec<WorkflowTask>> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM lrs_workflow_tasks
             WHERE transaction_id = $1
             ORDER BY task_id ASC"
        );
        let rows = sqlx::query_as::<_, WorkflowTaskRow>(&sql)
            .bind(transaction_id)
            .fetch_all(pool)
            .await?;

        rows.into_iter().map(WorkflowTask::try_from).collect()
    }

    /// Insert `new_task` as the transaction's current task and close the
    /// previous one, atomically.
    ///
    /// The previous open task is locked with `FOR UPDATE`; if its `next_status`
    /// no longer matches `new_task.current_status` another request moved the
    /// transaction first and the write is refused.
    pub async fn create_superseding(
        pool: &PgPool,
        transaction_id: i64,
        new_task: NewWorkflowTask,
    ) -> PersistenceResult<WorkflowTask> {
        let mut tx = pool.begin().await?;
        let task = Self::supersede_open_task(&mut tx, transaction_id, new_task).await?;
        tx.commit().await?;
        Ok(task)
    }

    async fn supersede_open_task(
        conn: &mut PgConnection,
        transaction_id: i64,
        new_task: NewWorkflowTask,
    ) -> PersistenceResult<WorkflowTask> {
        let now = Utc::now().naive_utc();

        let open_sql = format!(
            "SELECT {TASK_COLUMNS} FROM lrs_workflow_tasks
             WHERE transaction_id = $1 AND task_status = 'A' AND next_task_id IS NULL
             FOR UPDATE"
        );
        let previous = sqlx::query_as::<_, WorkflowTaskRow>(&open_sql)
            .bind(transaction_id)
            .fetch_optional(&mut *conn)
            .await?
            .map(WorkflowTask::try_from)
            .transpose()?;

        Self::check_supersedes(previous.as_ref(), &new_task, transaction_id)?;

        let insert_sql = format!(
            "INSERT INTO lrs_workflow_tasks
             (transaction_id, event_name, mode, assigned_by_id, responsible_id, next_contact_id,
              current_status, next_status, check_in_time, notes, previous_task_id, task_status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'A')
             RETURNING {TASK_COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, WorkflowTaskRow>(&insert_sql)
            .bind(transaction_id)
            .bind(&new_task.event_name)
            .bind(new_task.mode.code().to_string())
            .bind(new_task.assigned_by_id)
            .bind(new_task.responsible_id)
            .bind(new_task.next_contact_id)
            .bind(new_task.current_status.code().to_string())
            .bind(new_task.next_status.code().to_string())
            .bind(now)
            .bind(&new_task.notes)
            .bind(previous.as_ref().map(|task| task.task_id))
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| PersistenceError::TaskSaveFailed {
                reason: format!("Failed to insert workflow task: {e}"),
            })?;

        if let Some(previous) = &previous {
            sqlx::query(
                r#"
                UPDATE lrs_workflow_tasks
                SET next_task_id = $1,
                    end_process_time = COALESCE(end_process_time, $2),
                    check_out_time = $2
                WHERE task_id = $3
                "#,
            )
            .bind(inserted.task_id)
            .bind(now)
            .bind(previous.task_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| PersistenceError::TaskSaveFailed {
                reason: format!("Failed to close previous workflow task: {e}"),
            })?;
        }

        WorkflowTask::try_from(inserted)
    }

    /// Undo the last revertible step of `transaction` with a compensating
    /// task, flagging the undone task as deleted. Closed tasks keep their
    /// links and times.
    pub async fn revert_last_step(
        pool: &PgPool,
        transaction: &Transaction,
        reverted_by: i64,
    ) -> PersistenceResult<WorkflowTask> {
        let transaction_id = transaction.transaction_id;
        let plan = transaction
            .plan_revert(reverted_by)
            .map_err(|e| revert_failure(transaction_id, e))?;
        let expected_open = transaction.current_task().map(|task| task.task_id);

        let mut tx = pool.begin().await?;
        let task = Self::supersede_open_task(&mut tx, transaction_id, plan.compensation).await?;
        if task.previous_task_id != expected_open {
            return Err(PersistenceError::ConcurrentModification { transaction_id });
        }

        let flagged = sqlx::query(
            "UPDATE lrs_workflow_tasks SET task_status = 'X' WHERE task_id = $1 AND task_status = 'A'",
        )
        .bind(plan.undone_task_id)
        .execute(&mut *tx)
        .await?;
        if flagged.rows_affected() != 1 {
            return Err(PersistenceError::ConcurrentModification { transaction_id });
        }

        tx.commit().await?;
        Ok(task)
    }
}
