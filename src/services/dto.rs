//! Response and request shapes handed to the HTTP host.

use crate::models::transaction::Transaction;
use crate::models::workflow_task::{TaskLifecycleStatus, WorkflowTask, WorkflowTaskMode};
use crate::state_machine::commands::{CommandDescriptor, WorkflowCommandType};
use crate::state_machine::states::TransactionStatus;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedStatusDto {
    pub uid: TransactionStatus,
    pub name: String,
}

impl From<TransactionStatus> for NamedStatusDto {
    fn from(status: TransactionStatus) -> Self {
        Self {
            uid: status,
            name: status.label().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDto {
    #[serde(rename = "type")]
    pub command_type: WorkflowCommandType,
    pub name: String,
    pub label: String,
    pub next_statuses: Vec<NamedStatusDto>,
    pub requires_responsible: bool,
}

impl From<&CommandDescriptor> for CommandDto {
    fn from(descriptor: &CommandDescriptor) -> Self {
        Self {
            command_type: descriptor.command_type,
            name: descriptor.name.clone(),
            label: descriptor.label.clone(),
            next_statuses: descriptor
                .next_statuses
                .iter()
                .copied()
                .map(NamedStatusDto::from)
                .collect(),
            requires_responsible: descriptor.requires_responsible,
        }
    }
}

pub fn map_commands(descriptors: &[CommandDescriptor]) -> Vec<CommandDto> {
    descriptors.iter().map(CommandDto::from).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowTaskDto {
    pub task_id: i64,
    pub transaction_uid: String,
    pub event_name: String,
    pub mode: WorkflowTaskMode,
    pub assigned_by_id: i64,
    pub responsible_id: i64,
    pub next_contact_id: Option<i64>,
    pub current_status: NamedStatusDto,
    pub next_status: NamedStatusDto,
    pub check_in_time: NaiveDateTime,
    pub end_process_time: Option<NaiveDateTime>,
    pub check_out_time: Option<NaiveDateTime>,
    pub elapsed_seconds: Option<i64>,
    pub notes: String,
    pub is_open: bool,
    pub lifecycle_status: TaskLifecycleStatus,
}

impl WorkflowTaskDto {
    pub fn map(transaction: &Transaction, task: &WorkflowTask) -> Self {
        Self {
            task_id: task.task_id,
            transaction_uid: transaction.uid().to_string(),
            event_name: task.event_name.clone(),
            mode: task.mode,
            assigned_by_id: task.assigned_by_id,
            responsible_id: task.responsible_id,
            next_contact_id: task.next_contact_id,
            current_status: task.current_status.into(),
            next_status: task.next_status.into(),
            check_in_time: task.check_in_time,
            end_process_time: task.end_process_time,
            check_out_time: task.check_out_time,
            elapsed_seconds: task.elapsed().map(|elapsed| elapsed.num_seconds()),
            notes: task.notes.clone(),
            is_open: task.is_open() && task.is_active(),
            lifecycle_status: task.lifecycle_status,
        }
    }
}

/// Commands available for one transaction together with where it stands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicableCommandsDto {
    pub transaction_uid: String,
    pub current_status: NamedStatusDto,
    pub current_task: Option<WorkflowTaskDto>,
    pub commands: Vec<CommandDto>,
}

/// Body of a command execution request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowCommandRequest {
    #[serde(rename = "type")]
    pub command_type: WorkflowCommandType,
    pub transaction_uids: Vec<String>,
    #[serde(default)]
    pub next_status: Option<TransactionStatus>,
    #[serde(default)]
    pub responsible_id: Option<i64>,
    #[serde(default)]
    pub next_contact_id: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandExecutionResultDto {
    pub execution_id: Uuid,
    #[serde(rename = "type")]
    pub command_type: WorkflowCommandType,
    pub tasks: Vec<WorkflowTaskDto>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_request_deserializes_with_defaults() {
        let request: WorkflowCommandRequest = serde_json::from_value(json!({
            "type": "assign_to",
            "transaction_uids": ["TR-00001", "TR-00002"],
            "next_status": "recording",
            "responsible_id": 12
        }))
        .unwrap();

        assert_eq!(request.command_type, WorkflowCommandType::AssignTo);
        assert_eq!(request.next_status, Some(TransactionStatus::Recording));
        assert_eq!(request.responsible_id, Some(12));
        assert_eq!(request.next_contact_id, None);
        assert_eq!(request.notes, None);
    }

    #[test]
    fn test_command_dto_lists_named_statuses() {
        let descriptor = CommandDescriptor::new(
            WorkflowCommandType::Refuse,
            vec![TransactionStatus::Revision, TransactionStatus::ToReturn],
        );
        let dto = CommandDto::from(&descriptor);
        let json = serde_json::to_value(&dto).unwrap();

        assert_eq!(json["type"], "refuse");
        assert_eq!(json["next_statuses"][1]["uid"], "to_return");
        assert_eq!(json["next_statuses"][1]["name"], "Ready to return");
    }
}
