//! Order state machine.

use std::sync::LazyLock;

use crate::error::Result;
use crate::state_machine::{StateMachine, TransitionTable};

use super::{OrderEvent, OrderStateContext, OrderStatus};

static ORDER_TRANSITIONS: LazyLock<TransitionTable<OrderStatus, OrderEvent>> =
    LazyLock::new(|| {
        use OrderEvent::*;
        use OrderStatus::*;

        TransitionTable::builder("order")
            .state(
                PendingPayment,
                [(Paid, PendingShipment), (Cancel, Cancelled), (Timeout, Cancelled)],
            )
            .state(
                PendingShipment,
                [(Ship, Shipped), (Cancel, Cancelled), (RefundApply, Refunding)],
            )
            .state(Shipped, [(Receive, Completed), (RefundApply, Refunding)])
            .state(Completed, [(RefundApply, Refunding)])
            .state(
                Refunding,
                [(RefundComplete, Refunded), (RefundFail, Completed)],
            )
            .terminal(Refunded)
            .terminal(Cancelled)
            .build()
    });

/// Decides order status transitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderStateMachine;

impl OrderStateMachine {
    pub fn new() -> Self {
        Self
    }

    /// Returns the shared order transition table.
    pub fn table(&self) -> &'static TransitionTable<OrderStatus, OrderEvent> {
        &ORDER_TRANSITIONS
    }
}

impl StateMachine<OrderStatus, OrderEvent, OrderStateContext> for OrderStateMachine {
    fn send_event(
        &self,
        current: OrderStatus,
        event: OrderEvent,
        context: &mut OrderStateContext,
    ) -> Result<OrderStatus> {
        self.table().send_event(current, event, context)
    }

    fn can_transit(&self, current: OrderStatus, target: OrderStatus) -> bool {
        self.table().can_transit(current, target)
    }

    fn possible_next_states(&self, current: OrderStatus) -> Vec<OrderStatus> {
        self.table().possible_next_states(current)
    }
}
