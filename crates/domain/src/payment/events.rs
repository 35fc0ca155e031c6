//! Payment lifecycle events.

use serde::{Deserialize, Serialize};

use crate::state_machine::Event;

/// Events that drive a payment through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentEvent {
    /// Not accepted in any status; payments are created directly in `Pending`.
    Create,
    Process,
    Success,
    Fail,
    Close,
    Timeout,
    RefundRequest,
    RefundSuccess,
    RefundFail,
}

impl PaymentEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentEvent::Create => "CREATE",
            PaymentEvent::Process => "PROCESS",
            PaymentEvent::Success => "SUCCESS",
            PaymentEvent::Fail => "FAIL",
            PaymentEvent::Close => "CLOSE",
            PaymentEvent::Timeout => "TIMEOUT",
            PaymentEvent::RefundRequest => "REFUND_REQUEST",
            PaymentEvent::RefundSuccess => "REFUND_SUCCESS",
            PaymentEvent::RefundFail => "REFUND_FAIL",
        }
    }
}

impl Event for PaymentEvent {}

impl std::fmt::Display for PaymentEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
