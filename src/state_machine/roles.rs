use serde::{Deserialize, Serialize};
use std::fmt;

/// Office role a user acts under when requesting workflow commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowRole {
    /// Front desk: receives filings and hands them back
    Reception,
    /// Distributes work among the office areas
    ControlDesk,
    /// Qualifies, records and elaborates instruments
    Analyst,
    /// Legal department
    Juridic,
    /// Registrar authorized to sign
    Signer,
    /// Scans delivered documents
    Digitalizer,
    /// Delivery window
    Delivery,
    /// Office supervisor
    Supervisor,
}

impl WorkflowRole {
    pub const ALL: [WorkflowRole; 8] = [
        Self::Reception,
        Self::ControlDesk,
        Self::Analyst,
        Self::Juridic,
        Self::Signer,
        Self::Digitalizer,
        Self::Delivery,
        Self::Supervisor,
    ];
}

impl fmt::Display for WorkflowRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reception => write!(f, "reception"),
            Self::ControlDesk => write!(f, "control_desk"),
            Self::Analyst => write!(f, "analyst"),
            Self::Juridic => write!(f, "juridic"),
            Self::Signer => write!(f, "signer"),
            Self::Digitalizer => write!(f, "digitalizer"),
            Self::Delivery => write!(f, "delivery"),
            Self::Supervisor => write!(f, "supervisor"),
        }
    }
}

impl std::str::FromStr for WorkflowRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|role| role.to_string() == s)
            .ok_or_else(|| format!("Invalid workflow role: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!(
            "control_desk".parse::<WorkflowRole>().unwrap(),
            WorkflowRole::ControlDesk
        );
        assert!("notary".parse::<WorkflowRole>().is_err());
    }
}
