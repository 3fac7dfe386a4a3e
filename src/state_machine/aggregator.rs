//! Computes the commands a user can apply to a whole selection of transactions.

use super::commands::CommandDescriptor;
use super::rules::WorkflowRules;
use crate::constants::components;
use crate::models::transaction::{Transaction, TransactionUid};
use crate::models::user::WorkflowUser;
use std::collections::HashSet;
use tracing::debug;

/// Accumulates the intersection of applicable commands across transactions.
///
/// A command survives only if it applies to every aggregated transaction. A
/// command that offers target statuses keeps only the targets common to all of
/// them and is dropped when none remain.
#[derive(Debug, Clone)]
pub struct WorkflowCommandsAggregator {
    rules: WorkflowRules,
    accumulated: Option<Vec<CommandDescriptor>>,
    seen: HashSet<TransactionUid>,
}

impl WorkflowCommandsAggregator {
    pub fn new(rules: WorkflowRules) -> Self {
        Self {
            rules,
            accumulated: None,
            seen: HashSet::new(),
        }
    }

    /// Intersect the commands applicable to `transaction` into the batch.
    /// Aggregating a UID a second time has no effect.
    pub fn aggregate(&mut self, transaction: &Transaction, user: &WorkflowUser) {
        if !self.seen.insert(transaction.uid().clone()) {
            return;
        }

        let status = transaction.current_status();
        let commands = self.rules.commands_for(status, user);
        debug!(
            component = components::AGGREGATOR,
            transaction_uid = %transaction.uid(),
            status = %status,
            commands = commands.len(),
            "Aggregating transaction commands"
        );

        self.accumulated = Some(match self.accumulated.take() {
            None => commands,
            Some(existing) => intersect(existing, &commands),
        });
    }

    /// Commands applicable to every transaction aggregated so far
    pub fn applicable_commands(&self) -> Vec<CommandDescriptor> {
        self.accumulated.clone().unwrap_or_default()
    }

    /// Number of distinct transactions aggregated
    pub fn transaction_count(&self) -> usize {
        self.seen.len()
    }

    /// Role-only query ignoring transaction state, for menu population
    pub fn all_applicable_user_commands(&self, user: &WorkflowUser) -> Vec<CommandDescriptor> {
        self.rules.all_user_commands(user)
    }
}

impl Default for WorkflowCommandsAggregator {
    fn default() -> Self {
        Self::new(WorkflowRules::default())
    }
}

fn intersect(
    existing: Vec<CommandDescriptor>,
    incoming: &[CommandDescriptor],
) -> Vec<CommandDescriptor> {
    existing
        .into_iter()
        .filter_map(|mut descriptor| {
            let other = incoming
                .iter()
                .find(|candidate| candidate.command_type == descriptor.command_type)?;
            descriptor.retain_targets(other);
            (!descriptor.next_statuses.is_empty()).then_some(descriptor)
        })
        .collect()
}
