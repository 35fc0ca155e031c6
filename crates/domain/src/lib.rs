//! Entity lifecycle state machines.
//!
//! This crate provides:
//! - The generic [`StateMachine`] contract over an immutable [`TransitionTable`]
//! - [`StateContext`], the per-attempt audit context, and [`StateChangeRecord`]
//! - Order, payment and refund machines with their status and event enums
//!
//! Machines are pure: they decide the next status and fill in the context,
//! but never persist anything.

pub mod context;
pub mod error;
pub mod order;
pub mod payment;
pub mod refund;
pub mod state_machine;

pub use context::{StateChangeRecord, StateContext};
pub use error::{Result, StateMachineError};
pub use order::{OrderEvent, OrderStateContext, OrderStateMachine, OrderStatus};
pub use payment::{
    PaymentDetails, PaymentEvent, PaymentStateContext, PaymentStateMachine, PaymentStatus,
};
pub use refund::{
    OperatorType, RefundDetails, RefundEvent, RefundStateContext, RefundStateMachine, RefundStatus,
};
pub use state_machine::{
    Event, StateMachine, Status, TransitionContext, TransitionTable, TransitionTableBuilder,
};
