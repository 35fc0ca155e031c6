//! Order lifecycle events.

use serde::{Deserialize, Serialize};

use crate::state_machine::Event;

/// Events that drive an order through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEvent {
    /// Payment was received.
    Paid,
    Ship,
    /// Buyer confirmed receipt.
    Receive,
    Cancel,
    /// Payment window elapsed.
    Timeout,
    RefundApply,
    RefundComplete,
    RefundFail,
}

impl OrderEvent {
    /// Returns the event name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderEvent::Paid => "PAID",
            OrderEvent::Ship => "SHIP",
            OrderEvent::Receive => "RECEIVE",
            OrderEvent::Cancel => "CANCEL",
            OrderEvent::Timeout => "TIMEOUT",
            OrderEvent::RefundApply => "REFUND_APPLY",
            OrderEvent::RefundComplete => "REFUND_COMPLETE",
            OrderEvent::RefundFail => "REFUND_FAIL",
        }
    }
}

impl Event for OrderEvent {}

impl std::fmt::Display for OrderEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
