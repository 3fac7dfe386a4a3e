// Transaction workflow: statuses, roles, the static rules table, the batch
// command aggregator, and the state machine that records workflow tasks.

pub mod aggregator;
pub mod commands;
pub mod errors;
pub mod guards;
pub mod in_memory;
pub mod persistence;
pub mod roles;
pub mod rules;
pub mod states;
pub mod transaction_state_machine;

// Re-export main types for convenient access
pub use aggregator::WorkflowCommandsAggregator;
pub use commands::{CommandDescriptor, WorkflowCommandType};
pub use errors::{GuardError, PersistenceError, StateMachineError};
pub use guards::{CommandIntent, TransitionGuard};
pub use in_memory::InMemoryTransactionStore;
pub use persistence::{PgTransactionStore, TransactionStore};
pub use roles::WorkflowRole;
pub use rules::{WorkflowRule, WorkflowRules};
pub use states::TransactionStatus;
pub use transaction_state_machine::{TaskDetails, TransactionStateMachine};
