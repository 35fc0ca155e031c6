//! Try-Confirm-Cancel transaction manager.
//!
//! This crate coordinates multi-step business operations that cannot share
//! one database transaction:
//! 1. `begin` persists a `Trying` record in the shared store
//! 2. `try_action` reserves resources through a [`TccAction`]
//! 3. `confirm_action` commits them, or `cancel_action` releases them
//!
//! Each phase runs under a per-transaction distributed lock. Failed
//! confirm/cancel attempts are counted on the record and escalated once
//! the configured retry budget is spent.

pub mod action;
pub mod actions;
pub mod config;
pub mod error;
pub mod manager;
pub mod status;
pub mod telemetry;
pub mod transaction;

pub use action::{ActionError, Phase, TccAction};
pub use actions::{
    InMemoryPaymentCapture, InMemoryStockReservation, PaymentCaptureParams, StockItem,
    StockReservationParams,
};
pub use common::TransactionId;
pub use config::{LogFormat, TccConfig, TtlPolicy};
pub use error::{Result, TccError};
pub use manager::TccTransactionManager;
pub use status::TransactionStatus;
pub use telemetry::init_tracing;
pub use transaction::TccTransaction;
