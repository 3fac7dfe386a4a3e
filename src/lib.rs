#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Recorder Workflow
//!
//! Transaction workflow for a land registry recorder office.
//!
//! ## Overview
//!
//! Every transaction presented to the office (a deed, a lien, a certificate
//! request) moves through a fixed set of statuses from payment to delivery.
//! Each move is recorded as a workflow task: who moved it, who is responsible
//! next, and when. The status of a transaction is always the target status of
//! its latest active task.
//!
//! Which commands a user may issue is decided by a static rules table keyed
//! by the transaction status and the user's roles. For a selection of several
//! transactions only the commands applicable to all of them are offered.
//!
//! ## Module Organization
//!
//! - [`state_machine`] - Statuses, roles, rules table, aggregator and transitions
//! - [`models`] - Transactions, workflow tasks and users
//! - [`services`] - Use cases and response DTOs for the hosting application
//! - [`config`] - Layered configuration
//! - [`logging`] - Structured logging setup
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use recorder_workflow::config::WorkflowSettings;
//! use recorder_workflow::models::{TransactionUid, WorkflowUser};
//! use recorder_workflow::services::WorkflowUseCases;
//! use recorder_workflow::state_machine::{InMemoryTransactionStore, WorkflowRole};
//! use std::sync::Arc;
//!
//! # async fn example() -> recorder_workflow::Result<()> {
//! let store = Arc::new(InMemoryTransactionStore::new());
//! store.create_transaction(TransactionUid::parse("TR-00042")?, "Deed", "Notary 12");
//!
//! let use_cases = WorkflowUseCases::new(store, WorkflowSettings::default());
//! let user = WorkflowUser::new(7, "front desk").with_role(WorkflowRole::Reception);
//!
//! let applicable = use_cases.get_applicable_commands("TR-00042", &user).await?;
//! for command in applicable.commands {
//!     println!("{} -> {:?}", command.name, command.next_statuses);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod state_machine;
pub mod validation;

pub use crate::config::{ConfigManager, RecorderConfig, WorkflowSettings};
pub use error::{RecorderError, Result};
pub use logging::init_structured_logging;
pub use models::{Transaction, TransactionUid, WorkflowTask, WorkflowUser};
pub use services::WorkflowUseCases;
pub use state_machine::{
    CommandDescriptor, InMemoryTransactionStore, PgTransactionStore, TransactionStatus,
    TransactionStore, WorkflowCommandType, WorkflowCommandsAggregator, WorkflowRole,
    WorkflowRules,
};
