//! Order lifecycle.

mod events;
mod machine;
mod state;

pub use events::OrderEvent;
pub use machine::OrderStateMachine;
pub use state::OrderStatus;

use crate::context::StateContext;

/// Transition context for orders; `entity_id` is the order number.
pub type OrderStateContext = StateContext<OrderStatus, OrderEvent>;
