//! Payment state machine.

use std::sync::LazyLock;

use crate::error::Result;
use crate::state_machine::{StateMachine, TransitionTable};

use super::{PaymentEvent as E, PaymentStateContext, PaymentStatus as S};

static PAYMENT_TRANSITIONS: LazyLock<TransitionTable<S, E>> = LazyLock::new(|| {
    TransitionTable::builder("payment")
        .state(
            S::Pending,
            [
                (E::Process, S::Processing),
                (E::Close, S::Closed),
                (E::Timeout, S::Closed),
            ],
        )
        .state(
            S::Processing,
            [
                (E::Success, S::Success),
                (E::Fail, S::Failed),
                (E::Close, S::Closed),
                (E::Timeout, S::Closed),
            ],
        )
        .state(S::Success, [(E::RefundRequest, S::Refunding)])
        .state(
            S::Refunding,
            [(E::RefundSuccess, S::Refunded), (E::RefundFail, S::Failed)],
        )
        .terminal(S::Failed)
        .terminal(S::Closed)
        .terminal(S::Refunded)
        .build()
});

/// Decides payment status transitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentStateMachine;

impl PaymentStateMachine {
    pub fn new() -> Self {
        Self
    }

    pub fn table(&self) -> &'static TransitionTable<S, E> {
        &PAYMENT_TRANSITIONS
    }
}

impl StateMachine<S, E, PaymentStateContext> for PaymentStateMachine {
    fn send_event(&self, current: S, event: E, context: &mut PaymentStateContext) -> Result<S> {
        self.table().send_event(current, event, context)
    }

    fn can_transit(&self, current: S, target: S) -> bool {
        self.table().can_transit(current, target)
    }

    fn possible_next_states(&self, current: S) -> Vec<S> {
        self.table().possible_next_states(current)
    }
}
