//! Use-case boundary of the workflow. Validates caller input, loads
//! transactions, and maps rule results into DTOs.

use super::dto::{
    map_commands, ApplicableCommandsDto, CommandDto, CommandExecutionResultDto, WorkflowCommandRequest,
    WorkflowTaskDto,
};
use crate::config::WorkflowSettings;
use crate::constants::{components, events};
use crate::error::{RecorderError, Result};
use crate::logging::{log_command_operation, log_error, log_transaction_operation};
use crate::models::transaction::{Transaction, TransactionUid};
use crate::models::user::WorkflowUser;
use crate::state_machine::aggregator::WorkflowCommandsAggregator;
use crate::state_machine::errors::business_rule_violation;
use crate::state_machine::guards::{CommandIntent, TransitionGuard};
use crate::state_machine::persistence::{require_transaction, TransactionStore};
use crate::state_machine::rules::WorkflowRules;
use crate::state_machine::transaction_state_machine::{TaskDetails, TransactionStateMachine};
use crate::validation::{validate_batch_size, validate_notes, validate_uid_batch};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

pub struct WorkflowUseCases {
    store: Arc<dyn TransactionStore>,
    rules: WorkflowRules,
    settings: WorkflowSettings,
}

impl WorkflowUseCases {
    pub fn new(store: Arc<dyn TransactionStore>, settings: WorkflowSettings) -> Self {
        Self {
            store,
            rules: WorkflowRules::default(),
            settings,
        }
    }

    pub fn rules(&self) -> &WorkflowRules {
        &self.rules
    }

    /// Commands `user` can apply to one transaction, plus its current task
    #[instrument(skip(self, user), fields(party_id = user.party_id))]
    pub async fn get_applicable_commands(
        &self,
        transaction_uid: &str,
        user: &WorkflowUser,
    ) -> Result<ApplicableCommandsDto> {
        let transaction = self.load(transaction_uid).await?;

        let mut aggregator = WorkflowCommandsAggregator::new(self.rules);
        aggregator.aggregate(&transaction, user);
        let commands = map_commands(&aggregator.applicable_commands());

        log_command_operation(
            "get_applicable_commands",
            None,
            user.party_id,
            1,
            commands.len(),
        );

        Ok(ApplicableCommandsDto {
            transaction_uid: transaction.uid().to_string(),
            current_status: transaction.current_status().into(),
            current_task: transaction
                .current_task()
                .map(|task| WorkflowTaskDto::map(&transaction, task)),
            commands,
        })
    }

    /// Commands applicable to every transaction in the selection. An empty or
    /// missing selection yields no commands.
    #[instrument(skip(self, transaction_uids, user), fields(party_id = user.party_id))]
    pub async fn get_applicable_commands_for_multiple_transactions(
        &self,
        transaction_uids: Option<&[String]>,
        user: &WorkflowUser,
    ) -> Result<Vec<CommandDto>> {
        let uids = parse_selection(transaction_uids.unwrap_or_default())?;
        if uids.is_empty() {
            return Ok(Vec::new());
        }
        validate_batch_size(uids.len(), self.settings.max_batch_size)?;

        let transactions = self.load_many(&uids).await?;
        let aggregator = self.aggregate(&transactions, user);
        let commands = map_commands(&aggregator.applicable_commands());

        log_command_operation(
            "get_applicable_commands_for_multiple_transactions",
            None,
            user.party_id,
            aggregator.transaction_count(),
            commands.len(),
        );
        Ok(commands)
    }

    /// Every command the user's roles allow, regardless of transaction state
    pub fn get_all_applicable_user_commands(&self, user: &WorkflowUser) -> Vec<CommandDto> {
        let aggregator = WorkflowCommandsAggregator::new(self.rules);
        map_commands(&aggregator.all_applicable_user_commands(user))
    }

    pub async fn get_current_task(&self, transaction_uid: &str) -> Result<Option<WorkflowTaskDto>> {
        let transaction = self.load(transaction_uid).await?;
        Ok(transaction
            .current_task()
            .map(|task| WorkflowTaskDto::map(&transaction, task)))
    }

    /// Full task history, oldest first, including reverted steps
    pub async fn get_workflow_history(&self, transaction_uid: &str) -> Result<Vec<WorkflowTaskDto>> {
        let transaction = self.load(transaction_uid).await?;
        Ok(transaction
            .tasks
            .iter()
            .map(|task| WorkflowTaskDto::map(&transaction, task))
            .collect())
    }

    /// Apply a command to every selected transaction.
    ///
    /// The command must be applicable to the whole selection before anything
    /// is written; transactions are then moved one at a time.
    #[instrument(skip(self, request, user), fields(command = %request.command_type, party_id = user.party_id))]
    pub async fn execute_command(
        &self,
        request: WorkflowCommandRequest,
        user: &WorkflowUser,
    ) -> Result<CommandExecutionResultDto> {
        let uids = parse_selection(&request.transaction_uids)?;
        validate_uid_batch(uids.len(), self.settings.max_batch_size)?;
        let notes = request.notes.clone().unwrap_or_default();
        validate_notes(&notes)?;

        let transactions = self.load_many(&uids).await?;
        let aggregator = self.aggregate(&transactions, user);

        let intent = CommandIntent {
            command: request.command_type,
            target_status: request.next_status,
            responsible_id: request.responsible_id,
        };

        let Some(descriptor) = aggregator
            .applicable_commands()
            .into_iter()
            .find(|descriptor| descriptor.command_type == request.command_type)
        else {
            let err: RecorderError = business_rule_violation(format!(
                "Command {} is not applicable to all {} selected transactions",
                request.command_type,
                transactions.len()
            ))
            .into();
            log_error(
                components::USE_CASES,
                "execute_command",
                &err.to_string(),
                None,
            );
            return Err(err);
        };
        TransitionGuard::check_request(&descriptor, &intent)?;

        let execution_id = Uuid::new_v4();
        let mut tasks = Vec::with_capacity(transactions.len());

        for transaction in transactions {
            let mut state_machine =
                TransactionStateMachine::new(transaction, self.store.clone(), self.rules);
            let details = TaskDetails {
                next_contact_id: request.next_contact_id,
                notes: notes.clone(),
            };

            let task = state_machine
                .transition(user, &intent, details)
                .await
                .map_err(|e| {
                    warn!(
                        %execution_id,
                        transaction_uid = %state_machine.transaction().uid(),
                        error = %e,
                        "Command execution stopped"
                    );
                    RecorderError::from(e)
                })?;

            let transaction = state_machine.into_transaction();
            log_transaction_operation(
                &request.command_type.event_name(),
                Some(transaction.uid().as_str()),
                &transaction.current_status().to_string(),
                None,
            );
            tasks.push(WorkflowTaskDto::map(&transaction, &task));
        }

        log_command_operation(
            "execute_command",
            Some(request.command_type.name()),
            user.party_id,
            tasks.len(),
            tasks.len(),
        );

        Ok(CommandExecutionResultDto {
            execution_id,
            command_type: request.command_type,
            tasks,
        })
    }

    /// Undo the last step of a transaction and return the compensating task,
    /// which is now current
    pub async fn revert_last_step(
        &self,
        transaction_uid: &str,
        user: &WorkflowUser,
    ) -> Result<WorkflowTaskDto> {
        let transaction = self.load(transaction_uid).await?;
        let mut state_machine =
            TransactionStateMachine::new(transaction, self.store.clone(), self.rules);
        state_machine.revert(user).await?;

        let transaction = state_machine.into_transaction();
        log_transaction_operation(
            events::TRANSACTION_REVERTED,
            Some(transaction.uid().as_str()),
            &transaction.current_status().to_string(),
            None,
        );

        transaction
            .current_task()
            .map(|task| WorkflowTaskDto::map(&transaction, task))
            .ok_or_else(|| {
                RecorderError::HistoryIntegrityError(format!(
                    "Transaction {} has no current task after revert",
                    transaction.uid()
                ))
            })
    }

    fn aggregate(
        &self,
        transactions: &[Transaction],
        user: &WorkflowUser,
    ) -> WorkflowCommandsAggregator {
        let mut aggregator = WorkflowCommandsAggregator::new(self.rules);
        for transaction in transactions {
            aggregator.aggregate(transaction, user);
        }
        aggregator
    }

    async fn load(&self, transaction_uid: &str) -> Result<Transaction> {
        let uid = TransactionUid::parse(transaction_uid)?;
        self.load_parsed(&uid).await
    }

    async fn load_parsed(&self, uid: &TransactionUid) -> Result<Transaction> {
        let transaction = require_transaction(self.store.as_ref(), uid).await?;
        if self.settings.validate_history_on_load {
            transaction.validate_history()?;
        }
        Ok(transaction)
    }

    async fn load_many(&self, uids: &[TransactionUid]) -> Result<Vec<Transaction>> {
        try_join_all(uids.iter().map(|uid| self.load_parsed(uid))).await
    }
}

/// Parse every UID so malformed input is rejected before any lookup.
/// Repeated UIDs are kept once, in first-seen order.
fn parse_selection(transaction_uids: &[String]) -> Result<Vec<TransactionUid>> {
    let mut uids: Vec<TransactionUid> = Vec::with_capacity(transaction_uids.len());
    for raw in transaction_uids {
        let uid = TransactionUid::parse(raw)?;
        if !uids.contains(&uid) {
            uids.push(uid);
        }
    }
    Ok(uids)
}
