//! Order lifecycle status.

use serde::{Deserialize, Serialize};

use crate::state_machine::Status;

/// The status of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// PendingPayment ──► PendingShipment ──► Shipped ──► Completed
///       │                 │    │            │            │
///       │                 │    └────────────┴────────────┴──► Refunding ──► Refunded
///       └─────────────────┴──► Cancelled
/// ```
///
/// A failed refund moves `Refunding` back to `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created, waiting for the buyer to pay.
    #[default]
    PendingPayment,

    /// Paid, waiting to be shipped.
    PendingShipment,

    Shipped,

    /// Received by the buyer.
    Completed,

    /// Refund in progress.
    Refunding,

    /// Refunded (terminal state).
    Refunded,

    /// Cancelled before shipment (terminal state).
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::PendingPayment,
        OrderStatus::PendingShipment,
        OrderStatus::Shipped,
        OrderStatus::Completed,
        OrderStatus::Refunding,
        OrderStatus::Refunded,
        OrderStatus::Cancelled,
    ];

    /// Returns the persisted status code.
    pub fn code(&self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "pending_payment",
            OrderStatus::PendingShipment => "pending_shipment",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Refunding => "refunding",
            OrderStatus::Refunded => "refunded",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Parses a persisted status code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Refunded | OrderStatus::Cancelled)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        self.code()
    }
}

impl Status for OrderStatus {
    fn description(&self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "pending payment",
            OrderStatus::PendingShipment => "pending shipment",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Refunding => "refunding",
            OrderStatus::Refunded => "refunded",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_pending_payment() {
        assert_eq!(OrderStatus::default(), OrderStatus::PendingPayment);
    }

    #[test]
    fn test_code_round_trip() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(OrderStatus::from_code("pending_confirmation"), None);
        assert_eq!(OrderStatus::from_code("PENDING_PAYMENT"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!OrderStatus::PendingPayment.is_terminal());
        assert!(!OrderStatus::PendingShipment.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
        assert!(!OrderStatus::Completed.is_terminal());
        assert!(!OrderStatus::Refunding.is_terminal());
        assert!(OrderStatus::Refunded.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(OrderStatus::PendingPayment.to_string(), "pending_payment");
        assert_eq!(OrderStatus::Refunded.to_string(), "refunded");
    }

    #[test]
    fn test_serialization_uses_code() {
        let json = serde_json::to_string(&OrderStatus::PendingShipment).unwrap();
        assert_eq!(json, "\"pending_shipment\"");
        let back: OrderStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, OrderStatus::PendingShipment);
    }
}
