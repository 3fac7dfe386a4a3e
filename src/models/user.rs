//! # Workflow User
//!
//! The requesting party as seen by the workflow: who is acting and under which
//! office roles. Sessions and authentication live in the HTTP host; this model
//! only carries what the rules table needs.

use crate::state_machine::roles::WorkflowRole;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowUser {
    pub party_id: i64,
    pub name: String,
    pub roles: BTreeSet<WorkflowRole>,
}

impl WorkflowUser {
    pub fn new(party_id: i64, name: impl Into<String>) -> Self {
        Self {
            party_id,
            name: name.into(),
            roles: BTreeSet::new(),
        }
    }

    pub fn with_role(mut self, role: WorkflowRole) -> Self {
        self.roles.insert(role);
        self
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = WorkflowRole>) -> Self {
        self.roles.extend(roles);
        self
    }

    pub fn has_role(&self, role: WorkflowRole) -> bool {
        self.roles.contains(&role)
    }

    pub fn has_any_role(&self, roles: &[WorkflowRole]) -> bool {
        roles.iter().any(|role| self.has_role(*role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_membership() {
        let user = WorkflowUser::new(7, "Front desk")
            .with_roles([WorkflowRole::Reception, WorkflowRole::Delivery]);

        assert!(user.has_role(WorkflowRole::Reception));
        assert!(!user.has_role(WorkflowRole::Signer));
        assert!(user.has_any_role(&[WorkflowRole::Signer, WorkflowRole::Delivery]));
        assert!(!user.has_any_role(&[]));
    }
}
