//! Refund lifecycle events.

use serde::{Deserialize, Serialize};

use crate::state_machine::Event;

/// Events that drive a refund request through review and processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundEvent {
    /// (Re)submission by the buyer; keeps the request pending.
    Submit,
    Approve,
    Reject,
    Process,
    Complete,
    Fail,
    /// Withdrawn by the buyer.
    Cancel,
}

impl RefundEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundEvent::Submit => "SUBMIT",
            RefundEvent::Approve => "APPROVE",
            RefundEvent::Reject => "REJECT",
            RefundEvent::Process => "PROCESS",
            RefundEvent::Complete => "COMPLETE",
            RefundEvent::Fail => "FAIL",
            RefundEvent::Cancel => "CANCEL",
        }
    }
}

impl Event for RefundEvent {}

impl std::fmt::Display for RefundEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
