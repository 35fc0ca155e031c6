//! Payment lifecycle status.

use serde::{Deserialize, Serialize};

use crate::state_machine::Status;

/// The status of a payment.
///
/// Persisted as a small integer code (see [`PaymentStatus::code`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    /// Submitted to the gateway.
    Processing,
    Success,
    /// Rejected by the gateway or a refund failed (terminal state).
    Failed,
    /// Closed without payment (terminal state).
    Closed,
    Refunding,
    /// Refunded (terminal state).
    Refunded,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 7] = [
        PaymentStatus::Pending,
        PaymentStatus::Processing,
        PaymentStatus::Success,
        PaymentStatus::Failed,
        PaymentStatus::Closed,
        PaymentStatus::Refunding,
        PaymentStatus::Refunded,
    ];

    /// Returns the persisted status code.
    pub fn code(&self) -> i32 {
        match self {
            PaymentStatus::Pending => 0,
            PaymentStatus::Processing => 1,
            PaymentStatus::Success => 2,
            PaymentStatus::Failed => 3,
            PaymentStatus::Closed => 4,
            PaymentStatus::Refunding => 5,
            PaymentStatus::Refunded => 6,
        }
    }

    /// Parses a persisted status code.
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Failed | PaymentStatus::Closed | PaymentStatus::Refunded
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Processing => "PROCESSING",
            PaymentStatus::Success => "SUCCESS",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Closed => "CLOSED",
            PaymentStatus::Refunding => "REFUNDING",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }
}

impl Status for PaymentStatus {
    fn description(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "awaiting payment",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Success => "paid",
            PaymentStatus::Failed => "payment failed",
            PaymentStatus::Closed => "closed",
            PaymentStatus::Refunding => "refunding",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(PaymentStatus::Pending.code(), 0);
        assert_eq!(PaymentStatus::Refunded.code(), 6);
        assert_eq!(PaymentStatus::from_code(2), Some(PaymentStatus::Success));
        assert_eq!(PaymentStatus::from_code(7), None);
        assert_eq!(PaymentStatus::from_code(-1), None);
    }

    #[test]
    fn test_terminal_states() {
        let terminal: Vec<_> = PaymentStatus::ALL
            .into_iter()
            .filter(PaymentStatus::is_terminal)
            .collect();
        assert_eq!(
            terminal,
            vec![
                PaymentStatus::Failed,
                PaymentStatus::Closed,
                PaymentStatus::Refunded
            ]
        );
    }

    #[test]
    fn test_description_is_human_readable() {
        assert_eq!(PaymentStatus::Pending.description(), "awaiting payment");
        assert_eq!(PaymentStatus::Pending.to_string(), "PENDING");
    }
}
