//! Static table of the commands each office role may invoke per transaction status.

use super::commands::{CommandDescriptor, WorkflowCommandType};
use super::roles::WorkflowRole;
use super::states::TransactionStatus;
use crate::models::user::WorkflowUser;

use TransactionStatus::*;
use WorkflowCommandType as Cmd;
use WorkflowRole as Role;

/// One row of the rules table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowRule {
    pub command: WorkflowCommandType,
    pub from: &'static [TransactionStatus],
    pub targets: &'static [TransactionStatus],
    pub roles: &'static [WorkflowRole],
}

impl WorkflowRule {
    pub fn applies_to(&self, status: TransactionStatus, user: &WorkflowUser) -> bool {
        self.from.contains(&status) && user.has_any_role(self.roles)
    }
}

const ASSIGNABLE: &[TransactionStatus] =
    &[Qualification, Recording, Elaboration, Juridic, Digitalization];

static RULES: &[WorkflowRule] = &[
    WorkflowRule {
        command: Cmd::Receive,
        from: &[Payment],
        targets: &[Received],
        roles: &[Role::Reception],
    },
    WorkflowRule {
        command: Cmd::Delete,
        from: &[Payment],
        targets: &[Deleted],
        roles: &[Role::Reception, Role::Supervisor],
    },
    WorkflowRule {
        command: Cmd::Reentry,
        from: &[Delivered, Returned],
        targets: &[Reentry],
        roles: &[Role::Reception],
    },
    WorkflowRule {
        command: Cmd::PullToControlDesk,
        from: &TransactionStatus::IN_PROCESS,
        targets: &[Control],
        roles: &[Role::ControlDesk, Role::Supervisor],
    },
    WorkflowRule {
        command: Cmd::AssignTo,
        from: &[Received, Reentry, Control],
        targets: ASSIGNABLE,
        roles: &[Role::ControlDesk, Role::Supervisor],
    },
    WorkflowRule {
        command: Cmd::SetNextStatus,
        from: &[Qualification],
        targets: &[Recording, Elaboration, Juridic, ToReturn],
        roles: &[Role::Analyst],
    },
    WorkflowRule {
        command: Cmd::SetNextStatus,
        from: &[Recording, Elaboration],
        targets: &[Revision, ToReturn],
        roles: &[Role::Analyst],
    },
    WorkflowRule {
        command: Cmd::SetNextStatus,
        from: &[Revision],
        targets: &[OnSign, Recording, Elaboration, ToReturn],
        roles: &[Role::Analyst, Role::Supervisor],
    },
    WorkflowRule {
        command: Cmd::SetNextStatus,
        from: &[Juridic],
        targets: &[Qualification, OnSign, ToReturn],
        roles: &[Role::Juridic],
    },
    WorkflowRule {
        command: Cmd::Sign,
        from: &[OnSign],
        targets: &[ToDeliver],
        roles: &[Role::Signer],
    },
    WorkflowRule {
        command: Cmd::Refuse,
        from: &[OnSign],
        targets: &[Revision, ToReturn],
        roles: &[Role::Signer],
    },
    WorkflowRule {
        command: Cmd::Unsign,
        from: &[ToDeliver],
        targets: &[OnSign],
        roles: &[Role::Signer],
    },
    WorkflowRule {
        command: Cmd::Digitalize,
        from: &[Digitalization],
        targets: &[ToDeliver],
        roles: &[Role::Digitalizer],
    },
    WorkflowRule {
        command: Cmd::Deliver,
        from: &[ToDeliver],
        targets: &[Delivered],
        roles: &[Role::Delivery, Role::Reception],
    },
    WorkflowRule {
        command: Cmd::ReturnToRequester,
        from: &[ToReturn],
        targets: &[Returned],
        roles: &[Role::Delivery, Role::Reception],
    },
    WorkflowRule {
        command: Cmd::Archive,
        from: &[Delivered, Returned],
        targets: &[Archived],
        roles: &[Role::Supervisor],
    },
];

/// Lookup over the static rules table.
///
/// Every query is a pure function of its arguments; an empty result means the
/// user has nothing to do with the transaction in its current status.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowRules {
    rules: &'static [WorkflowRule],
}

impl Default for WorkflowRules {
    fn default() -> Self {
        Self { rules: RULES }
    }
}

impl WorkflowRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// All rows of the table, in declaration order
    pub fn rules(&self) -> &'static [WorkflowRule] {
        self.rules
    }

    /// Commands `user` may invoke on a transaction currently in `status`
    pub fn commands_for(
        &self,
        status: TransactionStatus,
        user: &WorkflowUser,
    ) -> Vec<CommandDescriptor> {
        collect_descriptors(
            self.rules
                .iter()
                .filter(|rule| rule.applies_to(status, user)),
        )
    }

    /// Commands a role can invoke on some status, ignoring transaction state
    pub fn commands_for_role(&self, role: WorkflowRole) -> Vec<CommandDescriptor> {
        collect_descriptors(self.rules.iter().filter(|rule| rule.roles.contains(&role)))
    }

    /// Commands any of the user's roles can invoke, ignoring transaction state
    pub fn all_user_commands(&self, user: &WorkflowUser) -> Vec<CommandDescriptor> {
        collect_descriptors(
            self.rules
                .iter()
                .filter(|rule| user.has_any_role(rule.roles)),
        )
    }

    /// Statuses `command` can move a transaction in `status` to, for this user
    pub fn target_statuses(
        &self,
        command: WorkflowCommandType,
        status: TransactionStatus,
        user: &WorkflowUser,
    ) -> Vec<TransactionStatus> {
        self.commands_for(status, user)
            .into_iter()
            .find(|descriptor| descriptor.command_type == command)
            .map(|descriptor| descriptor.next_statuses)
            .unwrap_or_default()
    }

    /// Whether the table defines any transition out of `status` for `role`
    pub fn has_transition(&self, status: TransactionStatus, role: WorkflowRole) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.from.contains(&status) && rule.roles.contains(&role))
    }
}

fn collect_descriptors<'a>(
    rules: impl Iterator<Item = &'a WorkflowRule>,
) -> Vec<CommandDescriptor> {
    let mut descriptors: Vec<CommandDescriptor> = Vec::new();

    for rule in rules {
        match descriptors
            .iter_mut()
            .find(|descriptor| descriptor.command_type == rule.command)
        {
            Some(existing) => existing.merge_targets(rule.targets),
            None => descriptors.push(CommandDescriptor::new(rule.command, rule.targets.to_vec())),
        }
    }

    descriptors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(roles: &[WorkflowRole]) -> WorkflowUser {
        WorkflowUser::new(1, "tester").with_roles(roles.iter().copied())
    }

    fn command_types(descriptors: &[CommandDescriptor]) -> Vec<WorkflowCommandType> {
        descriptors.iter().map(|d| d.command_type).collect()
    }

    #[test]
    fn test_reception_on_payment() {
        let rules = WorkflowRules::new();
        let commands = rules.commands_for(Payment, &user(&[Role::Reception]));

        assert_eq!(command_types(&commands), vec![Cmd::Receive, Cmd::Delete]);
        assert_eq!(commands[0].next_statuses, vec![Received]);
    }

    #[test]
    fn test_no_commands_is_empty_not_error() {
        let rules = WorkflowRules::new();
        assert!(rules.commands_for(Archived, &user(&WorkflowRole::ALL)).is_empty());
        assert!(rules.commands_for(OnSign, &user(&[Role::Reception])).is_empty());
        assert!(rules.commands_for(Payment, &user(&[])).is_empty());
    }

    #[test]
    fn test_assign_to_requires_responsible() {
        let rules = WorkflowRules::new();
        let commands = rules.commands_for(Control, &user(&[Role::ControlDesk]));

        assert_eq!(command_types(&commands), vec![Cmd::AssignTo]);
        assert!(commands[0].requires_responsible);
        assert_eq!(commands[0].next_statuses, ASSIGNABLE.to_vec());
    }

    #[test]
    fn test_multiple_roles_union_and_merge_targets() {
        let rules = WorkflowRules::new();
        let commands = rules.commands_for(
            Revision,
            &user(&[Role::Analyst, Role::Supervisor, Role::ControlDesk]),
        );

        assert_eq!(
            command_types(&commands),
            vec![Cmd::PullToControlDesk, Cmd::SetNextStatus]
        );
        assert_eq!(
            commands[1].next_statuses,
            vec![OnSign, Recording, Elaboration, ToReturn]
        );
    }

    #[test]
    fn test_role_commands_merge_rows_for_same_command() {
        let rules = WorkflowRules::new();
        let commands = rules.commands_for_role(Role::Analyst);

        assert_eq!(command_types(&commands), vec![Cmd::SetNextStatus]);
        assert_eq!(
            commands[0].next_statuses,
            vec![Recording, Elaboration, Juridic, ToReturn, Revision, OnSign]
        );
    }

    #[test]
    fn test_target_statuses() {
        let rules = WorkflowRules::new();
        let signer = user(&[Role::Signer]);

        assert_eq!(
            rules.target_statuses(Cmd::Refuse, OnSign, &signer),
            vec![Revision, ToReturn]
        );
        assert!(rules.target_statuses(Cmd::Sign, ToDeliver, &signer).is_empty());
    }

    #[test]
    fn test_non_empty_only_when_transition_defined() {
        let rules = WorkflowRules::new();
        for status in TransactionStatus::ALL {
            for role in WorkflowRole::ALL {
                let commands = rules.commands_for(status, &user(&[role]));
                assert_eq!(
                    !commands.is_empty(),
                    rules.has_transition(status, role),
                    "{status} / {role}"
                );
            }
        }
    }

    #[test]
    fn test_terminal_statuses_have_no_rules() {
        for rule in WorkflowRules::new().rules() {
            assert!(rule.from.iter().all(|status| !status.is_terminal()));
            assert!(!rule.targets.is_empty());
        }
    }
}
