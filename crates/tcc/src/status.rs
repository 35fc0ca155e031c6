//! TCC transaction status.

use serde::{Deserialize, Serialize};

/// The status of a TCC transaction record.
///
/// State transitions:
/// ```text
/// Trying ──┬──► Confirming ──► Confirmed
///          └──► Cancelling ──► Cancelled
/// ```
///
/// `Confirming` and `Cancelling` persist while a phase is running or after
/// it failed; the same phase may be retried from there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Resources are being reserved.
    #[default]
    Trying,

    /// Confirm phase started (or failed and awaits retry).
    Confirming,

    /// Cancel phase started (or failed and awaits retry).
    Cancelling,

    /// Committed (terminal state).
    Confirmed,

    /// Rolled back (terminal state).
    Cancelled,
}

impl TransactionStatus {
    /// Returns true if the try phase may run.
    pub fn can_try(&self) -> bool {
        matches!(self, TransactionStatus::Trying)
    }

    /// Returns true if the confirm phase may (re)run.
    pub fn can_confirm(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Trying | TransactionStatus::Confirming
        )
    }

    /// Returns true if the cancel phase may (re)run.
    pub fn can_cancel(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Trying | TransactionStatus::Cancelling
        )
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Confirmed | TransactionStatus::Cancelled
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Trying => "TRYING",
            TransactionStatus::Confirming => "CONFIRMING",
            TransactionStatus::Cancelling => "CANCELLING",
            TransactionStatus::Confirmed => "CONFIRMED",
            TransactionStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_trying() {
        assert_eq!(TransactionStatus::default(), TransactionStatus::Trying);
    }

    #[test]
    fn test_can_confirm() {
        assert!(TransactionStatus::Trying.can_confirm());
        assert!(TransactionStatus::Confirming.can_confirm());
        assert!(!TransactionStatus::Cancelling.can_confirm());
        assert!(!TransactionStatus::Confirmed.can_confirm());
        assert!(!TransactionStatus::Cancelled.can_confirm());
    }

    #[test]
    fn test_can_cancel() {
        assert!(TransactionStatus::Trying.can_cancel());
        assert!(!TransactionStatus::Confirming.can_cancel());
        assert!(TransactionStatus::Cancelling.can_cancel());
        assert!(!TransactionStatus::Confirmed.can_cancel());
        assert!(!TransactionStatus::Cancelled.can_cancel());
    }

    #[test]
    fn test_only_trying_can_try() {
        assert!(TransactionStatus::Trying.can_try());
        assert!(!TransactionStatus::Confirming.can_try());
        assert!(!TransactionStatus::Cancelled.can_try());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!TransactionStatus::Trying.is_terminal());
        assert!(!TransactionStatus::Confirming.is_terminal());
        assert!(!TransactionStatus::Cancelling.is_terminal());
        assert!(TransactionStatus::Confirmed.is_terminal());
        assert!(TransactionStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&TransactionStatus::Cancelling).unwrap();
        assert_eq!(json, "\"CANCELLING\"");
        let back: TransactionStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TransactionStatus::Cancelling);
    }
}
