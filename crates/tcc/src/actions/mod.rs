//! In-memory [`TccAction`](crate::TccAction) implementations for tests and benchmarks.

use std::sync::atomic::{AtomicBool, Ordering};

pub mod payment;
pub mod stock;

pub use payment::{InMemoryPaymentCapture, PaymentCaptureParams};
pub use stock::{InMemoryStockReservation, StockItem, StockReservationParams};

use crate::action::{ActionError, Phase};

/// Per-phase failure injection shared by the in-memory actions.
#[derive(Debug, Default)]
struct FailureSwitches {
    on_try: AtomicBool,
    on_confirm: AtomicBool,
    on_cancel: AtomicBool,
}

impl FailureSwitches {
    fn switch(&self, phase: Phase) -> &AtomicBool {
        match phase {
            Phase::Try => &self.on_try,
            Phase::Confirm => &self.on_confirm,
            Phase::Cancel => &self.on_cancel,
        }
    }

    fn set(&self, phase: Phase, fail: bool) {
        self.switch(phase).store(fail, Ordering::SeqCst);
    }

    fn check(&self, phase: Phase, resource: &str) -> Result<(), ActionError> {
        if self.switch(phase).load(Ordering::SeqCst) {
            return Err(ActionError::Unavailable(format!(
                "{resource} offline during {phase}"
            )));
        }
        Ok(())
    }
}
