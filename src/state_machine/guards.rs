use super::commands::{CommandDescriptor, WorkflowCommandType};
use super::errors::{business_rule_violation, GuardError, GuardResult};
use super::rules::WorkflowRules;
use super::states::TransactionStatus;
use crate::models::transaction::Transaction;
use crate::models::user::WorkflowUser;

/// What the caller asked a command to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandIntent {
    pub command: WorkflowCommandType,
    pub target_status: Option<TransactionStatus>,
    pub responsible_id: Option<i64>,
}

/// Guard conditions checked before a workflow command executes
#[derive(Debug)]
pub struct TransitionGuard;

impl TransitionGuard {
    /// Check `intent` against the transaction and resolve the status it moves to
    pub fn resolve_target(
        rules: &WorkflowRules,
        transaction: &Transaction,
        user: &WorkflowUser,
        intent: &CommandIntent,
    ) -> GuardResult<TransactionStatus> {
        let status = transaction.current_status();

        if status.is_terminal() {
            return Err(business_rule_violation(format!(
                "Transaction {} is {status} and accepts no further commands",
                transaction.uid()
            )));
        }

        let descriptor = rules
            .commands_for(status, user)
            .into_iter()
            .find(|descriptor| descriptor.command_type == intent.command)
            .ok_or_else(|| GuardError::CommandNotApplicable {
                command: intent.command.to_string(),
                status: status.to_string(),
            })?;

        Self::check_request(&descriptor, intent)
    }

    /// Check the caller supplied what `descriptor` needs and pick the target
    pub fn check_request(
        descriptor: &CommandDescriptor,
        intent: &CommandIntent,
    ) -> GuardResult<TransactionStatus> {
        Self::check_responsible(descriptor, intent)?;
        Self::select_target(descriptor, intent.target_status)
    }

    fn check_responsible(descriptor: &CommandDescriptor, intent: &CommandIntent) -> GuardResult<()> {
        if descriptor.requires_responsible && intent.responsible_id.is_none() {
            return Err(GuardError::MissingField {
                field: "responsible_id".to_string(),
            });
        }
        Ok(())
    }

    fn select_target(
        descriptor: &CommandDescriptor,
        requested: Option<TransactionStatus>,
    ) -> GuardResult<TransactionStatus> {
        match (requested, descriptor.next_statuses.as_slice()) {
            (Some(target), _) if descriptor.offers(target) => Ok(target),
            (Some(target), _) => Err(GuardError::InvalidState {
                state: format!("{target} is not a target of {}", descriptor.name),
            }),
            (None, [only]) => Ok(*only),
            (None, _) => Err(GuardError::MissingField {
                field: "next_status".to_string(),
            }),
        }
    }
}
