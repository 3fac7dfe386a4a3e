use super::errors::{PersistenceError, PersistenceResult};
use crate::models::transaction::{Transaction, TransactionUid};
use crate::models::workflow_task::{NewWorkflowTask, WorkflowTask};
use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Instant;

/// Storage for transactions and their workflow history
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Load a transaction with its full task history, oldest first
    async fn find_by_uid(&self, uid: &TransactionUid) -> PersistenceResult<Option<Transaction>>;

    /// Record `new_task` as the current task, closing the previous one
    async fn append_task(
        &self,
        transaction: &Transaction,
        new_task: NewWorkflowTask,
    ) -> PersistenceResult<WorkflowTask>;

    /// Undo the last revertible step with a compensating task on behalf of
    /// `reverted_by`, flagging the undone task as deleted
    async fn revert_last_step(
        &self,
        transaction: &Transaction,
        reverted_by: i64,
    ) -> PersistenceResult<WorkflowTask>;
}

/// Load a transaction or fail with `TransactionNotFound`
pub async fn require_transaction<S: TransactionStore + ?Sized>(
    store: &S,
    uid: &TransactionUid,
) -> PersistenceResult<Transaction> {
    store
        .find_by_uid(uid)
        .await?
        .ok_or_else(|| PersistenceError::TransactionNotFound {
            uid: uid.to_string(),
        })
}

/// PostgreSQL backed store over `lrs_transactions` / `lrs_workflow_tasks`
#[derive(Debug, Clone)]
pub struct PgTransactionStore {
    pool: PgPool,
}

impl PgTransactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TransactionStore for PgTransactionStore {
    async fn find_by_uid(&self, uid: &TransactionUid) -> PersistenceResult<Option<Transaction>> {
        let started = Instant::now();
        let transaction = Transaction::find_by_uid(&self.pool, uid).await?;

        crate::logging::log_database_operation(
            "find_by_uid",
            Some("lrs_transactions"),
            transaction.as_ref().map(|t| t.transaction_id),
            if transaction.is_some() { "found" } else { "missing" },
            Some(started.elapsed().as_millis() as u64),
            None,
        );
        Ok(transaction)
    }

    async fn append_task(
        &self,
        transaction: &Transaction,
        new_task: NewWorkflowTask,
    ) -> PersistenceResult<WorkflowTask> {
        let started = Instant::now();
        let task =
            WorkflowTask::create_superseding(&self.pool, transaction.transaction_id, new_task)
                .await?;

        crate::logging::log_database_operation(
            "append_task",
            Some("lrs_workflow_tasks"),
            Some(task.task_id),
            "inserted",
            Some(started.elapsed().as_millis() as u64),
            None,
        );
        Ok(task)
    }

    async fn revert_last_step(
        &self,
        transaction: &Transaction,
        reverted_by: i64,
    ) -> PersistenceResult<WorkflowTask> {
        let started = Instant::now();
        let task = WorkflowTask::revert_last_step(&self.pool, transaction, reverted_by).await?;

        crate::logging::log_database_operation(
            "revert_last_step",
            Some("lrs_workflow_tasks"),
            Some(task.task_id),
            "reverted",
            Some(started.elapsed().as_millis() as u64),
            None,
        );
        Ok(task)
    }
}
