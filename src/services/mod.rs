//! Use cases exposed to the hosting application, and the DTOs they return.

pub mod dto;
pub mod workflow_use_cases;

pub use dto::{
    ApplicableCommandsDto, CommandDto, CommandExecutionResultDto, NamedStatusDto,
    WorkflowCommandRequest, WorkflowTaskDto,
};
pub use workflow_use_cases::WorkflowUseCases;
