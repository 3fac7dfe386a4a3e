use super::{
    errors::{business_rule_violation, StateMachineResult},
    guards::{CommandIntent, TransitionGuard},
    persistence::TransactionStore,
    rules::WorkflowRules,
    states::TransactionStatus,
};
use crate::constants::components;
use crate::models::transaction::Transaction;
use crate::models::user::WorkflowUser;
use crate::models::workflow_task::{NewWorkflowTask, WorkflowTask, WorkflowTaskMode};
use crate::state_machine::roles::WorkflowRole;
use std::sync::Arc;
use tracing::{debug, info};

/// Moves one transaction through the office by executing workflow commands
pub struct TransactionStateMachine {
    transaction: Transaction,
    store: Arc<dyn TransactionStore>,
    rules: WorkflowRules,
}

/// Free-form parts of a command request that end up on the new task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDetails {
    pub next_contact_id: Option<i64>,
    pub notes: String,
}

impl TransactionStateMachine {
    pub fn new(transaction: Transaction, store: Arc<dyn TransactionStore>, rules: WorkflowRules) -> Self {
        Self {
            transaction,
            store,
            rules,
        }
    }

    pub fn current_status(&self) -> TransactionStatus {
        self.transaction.current_status()
    }

    /// Execute `intent` on behalf of `user`, persisting the new workflow task
    pub async fn transition(
        &mut self,
        user: &WorkflowUser,
        intent: &CommandIntent,
        details: TaskDetails,
    ) -> StateMachineResult<WorkflowTask> {
        let current_status = self.current_status();
        let target_status =
            TransitionGuard::resolve_target(&self.rules, &self.transaction, user, intent)?;

        debug!(
            component = components::RULES,
            transaction_uid = %self.transaction.uid(),
            command = %intent.command,
            from = %current_status,
            to = %target_status,
            "Guards passed"
        );

        let new_task = NewWorkflowTask {
            event_name: intent.command.event_name(),
            mode: WorkflowTaskMode::Manual,
            assigned_by_id: user.party_id,
            responsible_id: intent.responsible_id.unwrap_or(user.party_id),
            next_contact_id: details.next_contact_id,
            current_status,
            next_status: target_status,
            notes: details.notes,
        };

        let task = self.store.append_task(&self.transaction, new_task).await?;
        self.refresh().await?;

        info!(
            transaction_uid = %self.transaction.uid(),
            task_id = task.task_id,
            command = %intent.command,
            from = %current_status,
            to = %target_status,
            "Workflow transition recorded"
        );
        Ok(task)
    }

    /// Undo the last step with a compensating task. Only supervisors may revert.
    pub async fn revert(&mut self, user: &WorkflowUser) -> StateMachineResult<WorkflowTask> {
        if !user.has_role(WorkflowRole::Supervisor) {
            return Err(business_rule_violation(format!(
                "User {} is not allowed to revert workflow steps",
                user.party_id
            ))
            .into());
        }

        let task = self
            .store
            .revert_last_step(&self.transaction, user.party_id)
            .await?;
        self.refresh().await?;

        info!(
            transaction_uid = %self.transaction.uid(),
            task_id = task.task_id,
            status = %self.current_status(),
            "Workflow step reverted"
        );
        Ok(task)
    }

    async fn refresh(&mut self) -> StateMachineResult<()> {
        if let Some(transaction) = self.store.find_by_uid(self.transaction.uid()).await? {
            self.transaction = transaction;
        }
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.current_status().is_terminal()
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn into_transaction(self) -> Transaction {
        self.transaction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transaction::TransactionUid;
    use crate::state_machine::commands::WorkflowCommandType;
    use crate::state_machine::errors::StateMachineError;
    use crate::state_machine::in_memory::InMemoryTransactionStore;

    fn setup() -> (Arc<InMemoryTransactionStore>, TransactionStateMachine) {
        let store = Arc::new(InMemoryTransactionStore::new());
        let transaction = store.create_transaction(
            TransactionUid::parse("TR-00001").unwrap(),
            "Deed",
            "Notary",
        );
        let sm = TransactionStateMachine::new(transaction, store.clone(), WorkflowRules::new());
        (store, sm)
    }

    fn intent(command: WorkflowCommandType) -> CommandIntent {
        CommandIntent {
            command,
            target_status: None,
            responsible_id: None,
        }
    }

    #[tokio::test]
    async fn test_receive_then_assign() {
        let (_, mut sm) = setup();
        let reception = WorkflowUser::new(10, "reception").with_role(WorkflowRole::Reception);
        let desk = WorkflowUser::new(20, "desk").with_role(WorkflowRole::ControlDesk);

        let task = sm
            .transition(&reception, &intent(WorkflowCommandType::Receive), TaskDetails::default())
            .await
            .unwrap();
        assert_eq!(task.event_name, "workflow.receive");
        assert_eq!(task.responsible_id, 10);
        assert_eq!(sm.current_status(), TransactionStatus::Received);

        let assign = CommandIntent {
            command: WorkflowCommandType::AssignTo,
            target_status: Some(TransactionStatus::Qualification),
            responsible_id: Some(30),
        };
        let details = TaskDetails {
            next_contact_id: Some(40),
            notes: "Urgent".to_string(),
        };
        let task = sm.transition(&desk, &assign, details).await.unwrap();

        assert_eq!(task.assigned_by_id, 20);
        assert_eq!(task.responsible_id, 30);
        assert_eq!(task.next_contact_id, Some(40));
        assert_eq!(task.notes, "Urgent");
        assert_eq!(sm.current_status(), TransactionStatus::Qualification);
        assert!(sm.transaction().validate_history().is_ok());
    }

    #[tokio::test]
    async fn test_guard_failure_persists_nothing() {
        let (store, mut sm) = setup();
        let signer = WorkflowUser::new(10, "signer").with_role(WorkflowRole::Signer);

        let err = sm
            .transition(&signer, &intent(WorkflowCommandType::Sign), TaskDetails::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StateMachineError::GuardFailed(_)));

        let stored = store
            .find_by_uid(sm.transaction().uid())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_revert_requires_supervisor() {
        let (_, mut sm) = setup();
        let reception = WorkflowUser::new(10, "reception").with_role(WorkflowRole::Reception);
        let supervisor = WorkflowUser::new(99, "supervisor").with_role(WorkflowRole::Supervisor);

        sm.transition(&reception, &intent(WorkflowCommandType::Receive), TaskDetails::default())
            .await
            .unwrap();

        assert!(sm.revert(&reception).await.is_err());
        let reverted = sm.revert(&supervisor).await.unwrap();

        assert_eq!(reverted.event_name, "transaction.reverted");
        assert_eq!(reverted.assigned_by_id, 99);
        assert!(reverted.is_open());
        assert_eq!(sm.current_status(), TransactionStatus::Payment);
        assert_eq!(sm.transaction().tasks.len(), 3);
        assert!(!sm.transaction().tasks[1].is_active());
    }

    #[tokio::test]
    async fn test_delete_is_terminal() {
        let (_, mut sm) = setup();
        let reception = WorkflowUser::new(10, "reception").with_role(WorkflowRole::Reception);

        sm.transition(&reception, &intent(WorkflowCommandType::Delete), TaskDetails::default())
            .await
            .unwrap();
        assert!(sm.is_terminal());

        let err = sm
            .transition(&reception, &intent(WorkflowCommandType::Receive), TaskDetails::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StateMachineError::GuardFailed(ref guard) if guard.to_string().contains("deleted")));
    }
}
