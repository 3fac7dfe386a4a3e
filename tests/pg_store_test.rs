//! PostgreSQL store tests. Require `DATABASE_URL`; run with `cargo test -- --ignored`.

use recorder_workflow::models::{NewWorkflowTask, TransactionUid, WorkflowTaskMode};
use recorder_workflow::state_machine::{
    PersistenceError, PgTransactionStore, TransactionStatus, TransactionStore,
};
use sqlx::PgPool;

async fn seed_transaction(pool: &PgPool, uid: &str) -> i64 {
    seed_transaction_checked_in(pool, uid, "- INTERVAL '1 minute'").await
}

/// Seed with the initial task's check-in offset from UTC now by `offset`
async fn seed_transaction_checked_in(pool: &PgPool, uid: &str, offset: &str) -> i64 {
    let transaction_id: i64 = sqlx::query_scalar(
        "INSERT INTO lrs_transactions (transaction_uid, transaction_type, requested_by, presentation_time)
         VALUES ($1, 'Deed', 'Notary 12', NOW())
         RETURNING transaction_id",
    )
    .bind(uid)
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query(&format!(
        "INSERT INTO lrs_workflow_tasks
         (transaction_id, event_name, mode, current_status, next_status, check_in_time)
         VALUES ($1, 'transaction.created', 'A', 'Y', 'Y',
                 (NOW() AT TIME ZONE 'UTC') {offset})"
    ))
    .bind(transaction_id)
    .execute(pool)
    .await
    .unwrap();

    transaction_id
}

fn receive() -> NewWorkflowTask {
    NewWorkflowTask {
        event_name: "workflow.receive".to_string(),
        mode: WorkflowTaskMode::Manual,
        assigned_by_id: 7,
        responsible_id: 7,
        next_contact_id: None,
        current_status: TransactionStatus::Payment,
        next_status: TransactionStatus::Received,
        notes: "Received at front desk".to_string(),
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL database"]
async fn test_append_and_revert_round_trip(pool: PgPool) {
    seed_transaction(&pool, "TR-00001").await;
    let store = PgTransactionStore::new(pool);
    let uid = TransactionUid::parse("TR-00001").unwrap();

    let transaction = store.find_by_uid(&uid).await.unwrap().unwrap();
    assert_eq!(transaction.current_status(), TransactionStatus::Payment);
    assert_eq!(transaction.tasks.len(), 1);

    let task = store.append_task(&transaction, receive()).await.unwrap();
    assert_eq!(task.previous_task_id, Some(transaction.tasks[0].task_id));

    let transaction = store.find_by_uid(&uid).await.unwrap().unwrap();
    assert_eq!(transaction.current_status(), TransactionStatus::Received);
    assert!(transaction.validate_history().is_ok());
    assert_eq!(transaction.tasks[0].next_task_id, Some(task.task_id));
    assert!(transaction.tasks[0].check_out_time.is_some());

    let closed_before = transaction.tasks[0].clone();
    let compensation = store.revert_last_step(&transaction, 9).await.unwrap();
    assert_eq!(compensation.previous_task_id, Some(task.task_id));
    assert_eq!(compensation.event_name, "transaction.reverted");

    let transaction = store.find_by_uid(&uid).await.unwrap().unwrap();
    assert_eq!(transaction.current_status(), TransactionStatus::Payment);
    assert_eq!(transaction.tasks.len(), 3);
    assert_eq!(transaction.tasks[0], closed_before);
    assert!(!transaction.tasks[1].is_active());
    assert!(transaction.tasks[1].check_out_time.is_some());
    assert!(transaction.validate_history().is_ok());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL database"]
async fn test_history_loads_when_initial_task_is_checked_in_ahead(pool: PgPool) {
    seed_transaction_checked_in(&pool, "TR-00003", "+ INTERVAL '1 hour'").await;
    let store = PgTransactionStore::new(pool);
    let uid = TransactionUid::parse("TR-00003").unwrap();

    let transaction = store.find_by_uid(&uid).await.unwrap().unwrap();
    let task = store.append_task(&transaction, receive()).await.unwrap();
    assert!(task.check_in_time < transaction.tasks[0].check_in_time);

    let transaction = store.find_by_uid(&uid).await.unwrap().unwrap();
    assert_eq!(transaction.tasks[1].task_id, task.task_id);
    assert!(transaction.validate_history().is_ok());
    assert_eq!(transaction.current_status(), TransactionStatus::Received);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL database"]
async fn test_first_task_must_start_in_payment(pool: PgPool) {
    let transaction_id: i64 = sqlx::query_scalar(
        "INSERT INTO lrs_transactions (transaction_uid, transaction_type, requested_by)
         VALUES ('TR-00004', 'Deed', 'Notary 12')
         RETURNING transaction_id",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    let store = PgTransactionStore::new(pool);
    let uid = TransactionUid::parse("TR-00004").unwrap();
    let transaction = store.find_by_uid(&uid).await.unwrap().unwrap();
    assert_eq!(transaction.transaction_id, transaction_id);

    let mut skipping = receive();
    skipping.current_status = TransactionStatus::Received;
    skipping.next_status = TransactionStatus::Qualification;
    let err = store.append_task(&transaction, skipping).await.unwrap_err();
    assert!(matches!(err, PersistenceError::ConcurrentModification { .. }));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL database"]
async fn test_stale_transaction_is_refused(pool: PgPool) {
    seed_transaction(&pool, "TR-00002").await;
    let store = PgTransactionStore::new(pool);
    let uid = TransactionUid::parse("TR-00002").unwrap();

    let stale = store.find_by_uid(&uid).await.unwrap().unwrap();
    store.append_task(&stale, receive()).await.unwrap();

    let err = store.append_task(&stale, receive()).await.unwrap_err();
    assert!(matches!(err, PersistenceError::ConcurrentModification { .. }));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL database"]
async fn test_unknown_uid(pool: PgPool) {
    let store = PgTransactionStore::new(pool);
    let uid = TransactionUid::parse("TR-99999").unwrap();
    assert!(store.find_by_uid(&uid).await.unwrap().is_none());
}
