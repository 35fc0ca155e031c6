//! Payment capture action backed by the payment state machine.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::{
    PaymentDetails, PaymentEvent, PaymentStateContext, PaymentStateMachine, PaymentStatus,
    StateChangeRecord, StateMachine,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::FailureSwitches;
use crate::action::{ActionError, Phase, TccAction};

const OPERATOR: &str = "tcc";

/// Amount to authorize for one payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCaptureParams {
    pub payment_no: String,
    pub order_no: String,
    pub amount_cents: i64,
}

#[derive(Debug)]
struct PaymentHold {
    status: PaymentStatus,
    gateway_transaction_id: Option<String>,
    history: Vec<StateChangeRecord<PaymentStatus, PaymentEvent>>,
}

impl PaymentHold {
    fn new(gateway_transaction_id: Option<String>) -> Self {
        Self {
            status: PaymentStatus::Pending,
            gateway_transaction_id,
            history: Vec::new(),
        }
    }

    /// Applies `event` through the payment state machine and logs the change.
    fn apply(&mut self, payment_no: &str, event: PaymentEvent, reason: &str) -> Result<(), ActionError> {
        let mut ctx = PaymentStateContext::new(payment_no, self.status)
            .with_operator(OPERATOR)
            .with_reason(reason)
            .with_details(PaymentDetails {
                gateway_transaction_id: self.gateway_transaction_id.clone(),
            });
        self.status = PaymentStateMachine::new().send_event(self.status, event, &mut ctx)?;
        self.history.extend(ctx.record());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct GatewayState {
    payments: HashMap<String, PaymentHold>,
    next_id: u32,
    confirm_calls: usize,
    captured: usize,
    voided: usize,
}

/// Authorizes on try, captures on confirm, voids on cancel.
///
/// Every status change goes through [`PaymentStateMachine`], so an illegal
/// move (capturing a voided payment, voiding a captured one) surfaces as
/// [`ActionError::Rejected`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentCapture {
    state: Arc<RwLock<GatewayState>>,
    failures: Arc<FailureSwitches>,
}

impl InMemoryPaymentCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_on_try(&self, fail: bool) {
        self.failures.set(Phase::Try, fail);
    }

    pub fn set_fail_on_confirm(&self, fail: bool) {
        self.failures.set(Phase::Confirm, fail);
    }

    pub fn set_fail_on_cancel(&self, fail: bool) {
        self.failures.set(Phase::Cancel, fail);
    }

    pub async fn status(&self, payment_no: &str) -> Option<PaymentStatus> {
        self.state
            .read()
            .await
            .payments
            .get(payment_no)
            .map(|p| p.status)
    }

    /// State log of one payment, oldest first.
    pub async fn history(&self, payment_no: &str) -> Vec<StateChangeRecord<PaymentStatus, PaymentEvent>> {
        self.state
            .read()
            .await
            .payments
            .get(payment_no)
            .map(|p| p.history.clone())
            .unwrap_or_default()
    }

    pub async fn confirm_calls(&self) -> usize {
        self.state.read().await.confirm_calls
    }

    /// Number of payments actually captured.
    pub async fn captured_count(&self) -> usize {
        self.state.read().await.captured
    }

    /// Number of payments actually voided.
    pub async fn voided_count(&self) -> usize {
        self.state.read().await.voided
    }
}

#[async_trait]
impl TccAction for InMemoryPaymentCapture {
    type Params = PaymentCaptureParams;
    /// Gateway transaction id of the authorization.
    type Output = String;

    fn name(&self) -> &'static str {
        "payment_capture"
    }

    async fn try_action(&self, params: &PaymentCaptureParams) -> Result<String, ActionError> {
        self.failures.check(Phase::Try, "gateway")?;
        if params.amount_cents <= 0 {
            return Err(ActionError::Rejected(format!(
                "invalid amount {} for {}",
                params.amount_cents, params.payment_no
            )));
        }

        let mut guard = self.state.write().await;
        let state = &mut *guard;

        if let Some(existing) = state.payments.get(&params.payment_no) {
            return match (existing.status, &existing.gateway_transaction_id) {
                (PaymentStatus::Processing, Some(id)) => Ok(id.clone()),
                (status, _) => Err(ActionError::Rejected(format!(
                    "payment {} is already {}",
                    params.payment_no, status
                ))),
            };
        }

        state.next_id += 1;
        let gateway_id = format!("GW-{:04}", state.next_id);
        let mut hold = PaymentHold::new(Some(gateway_id.clone()));
        hold.apply(&params.payment_no, PaymentEvent::Process, "authorized")?;
        state.payments.insert(params.payment_no.clone(), hold);
        Ok(gateway_id)
    }

    async fn confirm(&self, params: &PaymentCaptureParams) -> Result<(), ActionError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        state.confirm_calls += 1;
        self.failures.check(Phase::Confirm, "gateway")?;

        let Some(hold) = state.payments.get_mut(&params.payment_no) else {
            return Err(ActionError::Rejected(format!(
                "no authorization for {}",
                params.payment_no
            )));
        };
        if hold.status == PaymentStatus::Success {
            return Ok(());
        }
        hold.apply(&params.payment_no, PaymentEvent::Success, "captured")?;
        state.captured += 1;
        Ok(())
    }

    async fn cancel(&self, params: &PaymentCaptureParams) -> Result<(), ActionError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        self.failures.check(Phase::Cancel, "gateway")?;

        let hold = state
            .payments
            .entry(params.payment_no.clone())
            .or_insert_with(|| PaymentHold::new(None));
        if hold.status == PaymentStatus::Closed {
            return Ok(());
        }
        let authorized = hold.status == PaymentStatus::Processing;
        hold.apply(&params.payment_no, PaymentEvent::Close, "voided")?;
        if authorized {
            state.voided += 1;
        }
        Ok(())
    }
}
