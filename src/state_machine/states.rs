use serde::{Deserialize, Serialize};
use std::fmt;

/// Processing status of a transaction inside the recorder office
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Filing created, waiting for fees to be paid
    Payment,
    /// Received at the front desk
    Received,
    /// Received again after being returned or delivered
    Reentry,
    /// Held at the control desk for distribution
    Control,
    /// Under legal qualification
    Qualification,
    /// Instrument is being recorded
    Recording,
    /// Certificate or document is being produced
    Elaboration,
    /// Work is being reviewed before signing
    Revision,
    /// Under review by the legal department
    Juridic,
    /// Waiting for the registrar signature
    OnSign,
    /// Documents are being scanned
    Digitalization,
    /// Ready to be handed to the requester
    ToDeliver,
    /// Handed to the requester
    Delivered,
    /// Rejected, ready to be handed back
    ToReturn,
    /// Handed back to the requester without registration
    Returned,
    /// Closed and archived
    Archived,
    /// Removed before it was received
    Deleted,
}

impl TransactionStatus {
    pub const ALL: [TransactionStatus; 17] = [
        Self::Payment,
        Self::Received,
        Self::Reentry,
        Self::Control,
        Self::Qualification,
        Self::Recording,
        Self::Elaboration,
        Self::Revision,
        Self::Juridic,
        Self::OnSign,
        Self::Digitalization,
        Self::ToDeliver,
        Self::Delivered,
        Self::ToReturn,
        Self::Returned,
        Self::Archived,
        Self::Deleted,
    ];

    /// Statuses the control desk may pull a transaction back from
    pub const IN_PROCESS: [TransactionStatus; 11] = [
        Self::Received,
        Self::Reentry,
        Self::Qualification,
        Self::Recording,
        Self::Elaboration,
        Self::Revision,
        Self::Juridic,
        Self::OnSign,
        Self::Digitalization,
        Self::ToDeliver,
        Self::ToReturn,
    ];

    /// Check if this is a terminal status (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Archived | Self::Deleted)
    }

    /// Check if the transaction is being worked inside the office
    pub fn is_in_process(&self) -> bool {
        Self::IN_PROCESS.contains(self)
    }

    /// Single character code used in the `lrs_workflow_tasks` status columns
    pub fn code(&self) -> char {
        match self {
            Self::Payment => 'Y',
            Self::Received => 'R',
            Self::Reentry => 'N',
            Self::Control => 'K',
            Self::Qualification => 'F',
            Self::Recording => 'G',
            Self::Elaboration => 'E',
            Self::Revision => 'V',
            Self::Juridic => 'J',
            Self::OnSign => 'S',
            Self::Digitalization => 'A',
            Self::ToDeliver => 'D',
            Self::Delivered => 'C',
            Self::ToReturn => 'L',
            Self::Returned => 'Q',
            Self::Archived => 'H',
            Self::Deleted => 'X',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        Self::ALL.iter().copied().find(|status| status.code() == code)
    }

    /// Human readable name shown to office staff
    pub fn label(&self) -> &'static str {
        match self {
            Self::Payment => "Awaiting payment",
            Self::Received => "Received",
            Self::Reentry => "Reentered",
            Self::Control => "Control desk",
            Self::Qualification => "Qualification",
            Self::Recording => "Recording",
            Self::Elaboration => "Elaboration",
            Self::Revision => "Revision",
            Self::Juridic => "Legal review",
            Self::OnSign => "On sign",
            Self::Digitalization => "Digitalization",
            Self::ToDeliver => "Ready to deliver",
            Self::Delivered => "Delivered",
            Self::ToReturn => "Ready to return",
            Self::Returned => "Returned",
            Self::Archived => "Archived",
            Self::Deleted => "Deleted",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Payment => "payment",
            Self::Received => "received",
            Self::Reentry => "reentry",
            Self::Control => "control",
            Self::Qualification => "qualification",
            Self::Recording => "recording",
            Self::Elaboration => "elaboration",
            Self::Revision => "revision",
            Self::Juridic => "juridic",
            Self::OnSign => "on_sign",
            Self::Digitalization => "digitalization",
            Self::ToDeliver => "to_deliver",
            Self::Delivered => "delivered",
            Self::ToReturn => "to_return",
            Self::Returned => "returned",
            Self::Archived => "archived",
            Self::Deleted => "deleted",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.to_string() == s)
            .ok_or_else(|| format!("Invalid transaction status: {s}"))
    }
}

/// Transactions start waiting for payment
impl Default for TransactionStatus {
    fn default() -> Self {
        Self::Payment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_terminal_check() {
        assert!(TransactionStatus::Archived.is_terminal());
        assert!(TransactionStatus::Deleted.is_terminal());
        assert!(!TransactionStatus::Payment.is_terminal());
        assert!(!TransactionStatus::Delivered.is_terminal());
        assert!(!TransactionStatus::Returned.is_terminal());
    }

    #[test]
    fn test_in_process_excludes_desk_and_closed_statuses() {
        assert!(TransactionStatus::Recording.is_in_process());
        assert!(!TransactionStatus::Control.is_in_process());
        assert!(!TransactionStatus::Payment.is_in_process());
        assert!(!TransactionStatus::Delivered.is_in_process());
    }

    #[test]
    fn test_codes_are_unique() {
        let codes: HashSet<char> = TransactionStatus::ALL.iter().map(|s| s.code()).collect();
        assert_eq!(codes.len(), TransactionStatus::ALL.len());
        assert_eq!(
            TransactionStatus::from_code('S'),
            Some(TransactionStatus::OnSign)
        );
        assert_eq!(TransactionStatus::from_code('?'), None);
    }

    #[test]
    fn test_status_string_conversion() {
        assert_eq!(TransactionStatus::ToDeliver.to_string(), "to_deliver");
        assert_eq!(
            "on_sign".parse::<TransactionStatus>().unwrap(),
            TransactionStatus::OnSign
        );
        assert!("signed".parse::<TransactionStatus>().is_err());
    }

    #[test]
    fn test_status_serde_matches_display() {
        for status in TransactionStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
        }
    }
}
