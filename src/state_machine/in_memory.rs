//! In-process `TransactionStore` with the same semantics as the PostgreSQL one.
//! Used by tests and by hosts that embed the workflow without a database.

use super::errors::{revert_failure, PersistenceError, PersistenceResult};
use super::persistence::TransactionStore;
use crate::constants::components;
use crate::models::transaction::{Transaction, TransactionUid};
use crate::models::workflow_task::{NewWorkflowTask, WorkflowTask};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::warn;

#[derive(Debug, Default)]
pub struct InMemoryTransactionStore {
    transactions: RwLock<HashMap<TransactionUid, Transaction>>,
    next_transaction_id: AtomicI64,
    next_task_id: AtomicI64,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_task_id(&self) -> i64 {
        self.next_task_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Register a new transaction with its initial `Payment` task
    pub fn create_transaction(
        &self,
        uid: TransactionUid,
        transaction_type: &str,
        requested_by: &str,
    ) -> Transaction {
        let transaction_id = self.next_transaction_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now().naive_utc();

        let mut transaction =
            Transaction::new(transaction_id, uid.clone(), transaction_type, requested_by);
        transaction.presentation_time = Some(now);
        transaction
            .tasks
            .push(WorkflowTask::initial(self.next_task_id(), transaction_id, now));

        self.transactions.write().insert(uid, transaction.clone());
        transaction
    }

    /// Store a fully built transaction as is, replacing any with the same UID
    pub fn insert(&self, transaction: Transaction) {
        let max_task_id = transaction
            .tasks
            .iter()
            .map(|task| task.task_id)
            .max()
            .unwrap_or(0);
        self.next_task_id.fetch_max(max_task_id, Ordering::SeqCst);
        self.next_transaction_id
            .fetch_max(transaction.transaction_id, Ordering::SeqCst);
        self.transactions
            .write()
            .insert(transaction.uid().clone(), transaction);
    }

    pub fn len(&self) -> usize {
        self.transactions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn find_by_uid(&self, uid: &TransactionUid) -> PersistenceResult<Option<Transaction>> {
        Ok(self.transactions.read().get(uid).cloned())
    }

    async fn append_task(
        &self,
        transaction: &Transaction,
        new_task: NewWorkflowTask,
    ) -> PersistenceResult<WorkflowTask> {
        let mut transactions = self.transactions.write();
        let stored = transactions.get_mut(transaction.uid()).ok_or_else(|| {
            PersistenceError::TransactionNotFound {
                uid: transaction.uid().to_string(),
            }
        })?;

        if let Err(err) =
            WorkflowTask::check_supersedes(stored.current_task(), &new_task, stored.transaction_id)
        {
            warn!(
                component = components::STORE,
                transaction_uid = %stored.uid(),
                stored_status = %stored.current_status(),
                expected_status = %new_task.current_status,
                "Refusing task for a transaction that moved on"
            );
            return Err(err);
        }

        let task_id = self.next_task_id();
        stored
            .append_task(task_id, new_task, Utc::now().naive_utc())
            .map_err(|e| PersistenceError::TaskSaveFailed {
                reason: e.to_string(),
            })
    }

    async fn revert_last_step(
        &self,
        transaction: &Transaction,
        reverted_by: i64,
    ) -> PersistenceResult<WorkflowTask> {
        let mut transactions = self.transactions.write();
        let stored = transactions.get_mut(transaction.uid()).ok_or_else(|| {
            PersistenceError::TransactionNotFound {
                uid: transaction.uid().to_string(),
            }
        })?;

        let transaction_id = stored.transaction_id;
        let stored_task = stored.current_task().map(|task| task.task_id);
        if stored_task != transaction.current_task().map(|task| task.task_id) {
            warn!(
                component = components::STORE,
                transaction_uid = %stored.uid(),
                stored_task = ?stored_task,
                "Refusing revert for a transaction that moved on"
            );
            return Err(PersistenceError::ConcurrentModification { transaction_id });
        }

        let task_id = self.next_task_id();
        stored
            .revert_last_step(task_id, reverted_by, Utc::now().naive_utc())
            .map_err(|e| revert_failure(transaction_id, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::workflow_task::WorkflowTaskMode;
    use crate::state_machine::states::TransactionStatus;

    fn receive() -> NewWorkflowTask {
        NewWorkflowTask {
            event_name: "workflow.receive".to_string(),
            mode: WorkflowTaskMode::Manual,
            assigned_by_id: 1,
            responsible_id: 1,
            next_contact_id: None,
            current_status: TransactionStatus::Payment,
            next_status: TransactionStatus::Received,
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn test_append_and_reload() {
        let store = InMemoryTransactionStore::new();
        let uid = TransactionUid::parse("TR-00001").unwrap();
        let transaction = store.create_transaction(uid.clone(), "Deed", "Notary");

        let task = store.append_task(&transaction, receive()).await.unwrap();
        assert_eq!(task.task_id, 2);
        assert_eq!(task.previous_task_id, Some(1));

        let reloaded = store.find_by_uid(&uid).await.unwrap().unwrap();
        assert_eq!(reloaded.current_status(), TransactionStatus::Received);
        assert!(reloaded.validate_history().is_ok());
    }

    #[tokio::test]
    async fn test_stale_append_is_concurrent_modification() {
        let store = InMemoryTransactionStore::new();
        let uid = TransactionUid::parse("TR-00001").unwrap();
        let transaction = store.create_transaction(uid, "Deed", "Notary");

        store.append_task(&transaction, receive()).await.unwrap();
        let err = store.append_task(&transaction, receive()).await.unwrap_err();
        assert!(matches!(err, PersistenceError::ConcurrentModification { .. }));
    }

    #[tokio::test]
    async fn test_revert_without_predecessor_fails() {
        let store = InMemoryTransactionStore::new();
        let uid = TransactionUid::parse("TR-00001").unwrap();
        let transaction = store.create_transaction(uid, "Deed", "Notary");

        let err = store.revert_last_step(&transaction, 99).await.unwrap_err();
        assert!(matches!(err, PersistenceError::NothingToRevert { .. }));
    }

    #[tokio::test]
    async fn test_revert_appends_and_keeps_history() {
        let store = InMemoryTransactionStore::new();
        let uid = TransactionUid::parse("TR-00001").unwrap();
        let transaction = store.create_transaction(uid.clone(), "Deed", "Notary");
        store.append_task(&transaction, receive()).await.unwrap();
        let loaded = store.find_by_uid(&uid).await.unwrap().unwrap();

        let compensation = store.revert_last_step(&loaded, 99).await.unwrap();
        assert_eq!(compensation.task_id, 3);
        assert_eq!(compensation.next_status, TransactionStatus::Payment);

        let reloaded = store.find_by_uid(&uid).await.unwrap().unwrap();
        assert_eq!(reloaded.tasks.len(), 3);
        assert_eq!(reloaded.tasks[0], loaded.tasks[0]);
        assert!(!reloaded.tasks[1].is_active());
        assert!(reloaded.validate_history().is_ok());

        // The same stale snapshot cannot revert twice
        let err = store.revert_last_step(&loaded, 99).await.unwrap_err();
        assert!(matches!(err, PersistenceError::ConcurrentModification { .. }));
    }

    #[tokio::test]
    async fn test_revert_reports_broken_history_as_integrity_error() {
        let store = InMemoryTransactionStore::new();
        let uid = TransactionUid::parse("TR-00001").unwrap();
        let mut transaction = store.create_transaction(uid.clone(), "Deed", "Notary");
        let task = transaction
            .append_task(2, receive(), Utc::now().naive_utc())
            .unwrap();
        // The undone step's predecessor is gone
        transaction.tasks.retain(|t| t.task_id == task.task_id);
        store.insert(transaction.clone());

        let err = store.revert_last_step(&transaction, 99).await.unwrap_err();
        assert!(matches!(err, PersistenceError::HistoryIntegrity { .. }));
    }

    #[tokio::test]
    async fn test_transaction_without_history_only_accepts_payment_start() {
        let store = InMemoryTransactionStore::new();
        let uid = TransactionUid::parse("TR-00001").unwrap();
        let empty = Transaction::new(1, uid.clone(), "Deed", "Notary");
        store.insert(empty.clone());

        let mut skipping = receive();
        skipping.current_status = TransactionStatus::Received;
        skipping.next_status = TransactionStatus::Qualification;
        let err = store.append_task(&empty, skipping).await.unwrap_err();
        assert!(matches!(err, PersistenceError::ConcurrentModification { .. }));

        let task = store.append_task(&empty, receive()).await.unwrap();
        assert_eq!(task.previous_task_id, None);
    }

    #[tokio::test]
    async fn test_unknown_transaction() {
        let store = InMemoryTransactionStore::new();
        let uid = TransactionUid::parse("TR-99999").unwrap();
        assert!(store.find_by_uid(&uid).await.unwrap().is_none());
        assert!(store.is_empty());
    }
}
