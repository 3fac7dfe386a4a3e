use chrono::{NaiveDate, NaiveDateTime};
use recorder_workflow::models::{
    NewWorkflowTask, Transaction, TransactionUid, WorkflowTask, WorkflowTaskMode, WorkflowUser,
};
use recorder_workflow::state_machine::{TransactionStatus, WorkflowRole};

pub fn check_in(hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 4)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

/// A transaction whose latest task moved it straight from payment to `status`
pub fn transaction_in(transaction_id: i64, uid: &str, status: TransactionStatus) -> Transaction {
    let mut transaction = Transaction::new(
        transaction_id,
        TransactionUid::parse(uid).unwrap(),
        "Deed",
        "Notary 12",
    );
    let first_task_id = transaction_id * 10;
    transaction
        .tasks
        .push(WorkflowTask::initial(first_task_id, transaction_id, check_in(8)));

    if status != TransactionStatus::Payment {
        transaction
            .append_task(
                first_task_id + 1,
                NewWorkflowTask {
                    event_name: "workflow.fixture".to_string(),
                    mode: WorkflowTaskMode::Manual,
                    assigned_by_id: 1,
                    responsible_id: 1,
                    next_contact_id: None,
                    current_status: TransactionStatus::Payment,
                    next_status: status,
                    notes: String::new(),
                },
                check_in(9),
            )
            .unwrap();
    }
    transaction
}

pub fn user_with(party_id: i64, roles: impl IntoIterator<Item = WorkflowRole>) -> WorkflowUser {
    WorkflowUser::new(party_id, format!("party-{party_id}")).with_roles(roles)
}
