//! Payment lifecycle.

mod events;
mod machine;
mod state;

pub use events::PaymentEvent;
pub use machine::PaymentStateMachine;
pub use state::PaymentStatus;

use serde::{Deserialize, Serialize};

use crate::context::StateContext;

/// Payment-specific context fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    /// Transaction id assigned by the third-party gateway, once known.
    pub gateway_transaction_id: Option<String>,
}

/// Transition context for payments; `entity_id` is the payment number.
pub type PaymentStateContext = StateContext<PaymentStatus, PaymentEvent, PaymentDetails>;
