use super::states::TransactionStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Commands a user can invoke to move a transaction through the office
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowCommandType {
    Receive,
    Delete,
    Reentry,
    PullToControlDesk,
    AssignTo,
    SetNextStatus,
    Sign,
    Refuse,
    Unsign,
    Digitalize,
    Deliver,
    ReturnToRequester,
    Archive,
}

impl WorkflowCommandType {
    pub const ALL: [WorkflowCommandType; 13] = [
        Self::Receive,
        Self::Delete,
        Self::Reentry,
        Self::PullToControlDesk,
        Self::AssignTo,
        Self::SetNextStatus,
        Self::Sign,
        Self::Refuse,
        Self::Unsign,
        Self::Digitalize,
        Self::Deliver,
        Self::ReturnToRequester,
        Self::Archive,
    ];

    /// Stable name used in DTOs and event identifiers
    pub fn name(&self) -> &'static str {
        match self {
            Self::Receive => "receive",
            Self::Delete => "delete",
            Self::Reentry => "reentry",
            Self::PullToControlDesk => "pull_to_control_desk",
            Self::AssignTo => "assign_to",
            Self::SetNextStatus => "set_next_status",
            Self::Sign => "sign",
            Self::Refuse => "refuse",
            Self::Unsign => "unsign",
            Self::Digitalize => "digitalize",
            Self::Deliver => "deliver",
            Self::ReturnToRequester => "return_to_requester",
            Self::Archive => "archive",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Receive => "Receive filing",
            Self::Delete => "Delete filing",
            Self::Reentry => "Reenter filing",
            Self::PullToControlDesk => "Pull to control desk",
            Self::AssignTo => "Assign to",
            Self::SetNextStatus => "Set next status",
            Self::Sign => "Sign",
            Self::Refuse => "Refuse signature",
            Self::Unsign => "Revoke signature",
            Self::Digitalize => "Finish digitalization",
            Self::Deliver => "Deliver to requester",
            Self::ReturnToRequester => "Return to requester",
            Self::Archive => "Archive",
        }
    }

    /// Event identifier recorded on the workflow task the command creates
    pub fn event_name(&self) -> String {
        format!("workflow.{}", self.name())
    }

    /// Commands that hand the transaction to a specific responsible party
    pub fn requires_responsible(&self) -> bool {
        matches!(self, Self::AssignTo)
    }
}

impl fmt::Display for WorkflowCommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for WorkflowCommandType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|command| command.name() == s)
            .ok_or_else(|| format!("Invalid workflow command: {s}"))
    }
}

/// An action a user may invoke next. Derived from the rules table, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    #[serde(rename = "type")]
    pub command_type: WorkflowCommandType,
    pub name: String,
    pub label: String,
    /// Statuses the user may choose from when invoking the command
    pub next_statuses: Vec<TransactionStatus>,
    pub requires_responsible: bool,
}

impl CommandDescriptor {
    pub fn new(command_type: WorkflowCommandType, next_statuses: Vec<TransactionStatus>) -> Self {
        Self {
            command_type,
            name: command_type.name().to_string(),
            label: command_type.label().to_string(),
            next_statuses,
            requires_responsible: command_type.requires_responsible(),
        }
    }

    /// Add target statuses not already offered, keeping first-seen order
    pub fn merge_targets(&mut self, targets: &[TransactionStatus]) {
        for target in targets {
            if !self.next_statuses.contains(target) {
                self.next_statuses.push(*target);
            }
        }
    }

    /// Keep only the target statuses also offered by `other`
    pub fn retain_targets(&mut self, other: &CommandDescriptor) {
        self.next_statuses
            .retain(|status| other.next_statuses.contains(status));
    }

    pub fn offers(&self, status: TransactionStatus) -> bool {
        self.next_statuses.contains(&status)
    }
}
