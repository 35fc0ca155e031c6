//! Refund lifecycle.

mod events;
mod machine;
mod state;

pub use events::RefundEvent;
pub use machine::RefundStateMachine;
pub use state::RefundStatus;

use serde::{Deserialize, Serialize};

use crate::context::StateContext;

/// Who performed a refund transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperatorType {
    User,
    Admin,
    System,
}

/// Refund-specific context fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundDetails {
    pub operator_type: Option<OperatorType>,
    pub operator_id: Option<i64>,
}

/// Transition context for refunds; `entity_id` is the refund number.
pub type RefundStateContext = StateContext<RefundStatus, RefundEvent, RefundDetails>;
