//! Refund lifecycle status.

use serde::{Deserialize, Serialize};

use crate::state_machine::Status;

/// The status of a refund request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundStatus {
    /// Submitted, awaiting review.
    #[default]
    Pending,
    Approved,
    /// Rejected or withdrawn (terminal state).
    Rejected,
    /// Money is being returned through the payment channel.
    Processing,
    Completed,
    Failed,
}

impl RefundStatus {
    pub const ALL: [RefundStatus; 6] = [
        RefundStatus::Pending,
        RefundStatus::Approved,
        RefundStatus::Rejected,
        RefundStatus::Processing,
        RefundStatus::Completed,
        RefundStatus::Failed,
    ];

    /// Returns the persisted status code.
    pub fn code(&self) -> &'static str {
        match self {
            RefundStatus::Pending => "PENDING",
            RefundStatus::Approved => "APPROVED",
            RefundStatus::Rejected => "REJECTED",
            RefundStatus::Processing => "PROCESSING",
            RefundStatus::Completed => "COMPLETED",
            RefundStatus::Failed => "FAILED",
        }
    }

    /// Parses a persisted status code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RefundStatus::Rejected | RefundStatus::Completed | RefundStatus::Failed
        )
    }

    pub fn as_str(&self) -> &'static str {
        self.code()
    }
}

impl Status for RefundStatus {
    fn description(&self) -> &'static str {
        match self {
            RefundStatus::Pending => "pending review",
            RefundStatus::Approved => "approved",
            RefundStatus::Rejected => "rejected",
            RefundStatus::Processing => "processing",
            RefundStatus::Completed => "completed",
            RefundStatus::Failed => "refund failed",
        }
    }
}

impl std::fmt::Display for RefundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for status in RefundStatus::ALL {
            assert_eq!(RefundStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(RefundStatus::from_code("pending"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!RefundStatus::Pending.is_terminal());
        assert!(!RefundStatus::Approved.is_terminal());
        assert!(!RefundStatus::Processing.is_terminal());
        assert!(RefundStatus::Rejected.is_terminal());
        assert!(RefundStatus::Completed.is_terminal());
        assert!(RefundStatus::Failed.is_terminal());
    }
}
