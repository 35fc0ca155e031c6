//! The business-side TCC contract.

use async_trait::async_trait;
use domain::StateMachineError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the three TCC phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Try,
    Confirm,
    Cancel,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Try => "try",
            Phase::Confirm => "confirm",
            Phase::Cancel => "cancel",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Failure reported by a business phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// The business rules refused the operation (for example, insufficient stock).
    #[error("rejected: {0}")]
    Rejected(String),

    /// A downstream resource could not be reached.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

impl From<StateMachineError> for ActionError {
    fn from(err: StateMachineError) -> Self {
        ActionError::Rejected(err.to_string())
    }
}

/// A business operation driven through try/confirm/cancel.
///
/// `confirm` and `cancel` must be idempotent: the manager may invoke them
/// more than once for the same transaction when a previous attempt failed
/// or its outcome was lost. `cancel` must also tolerate running without a
/// preceding successful `try_action`.
#[async_trait]
pub trait TccAction: Send + Sync {
    /// Business parameters passed to every phase.
    type Params: Send + Sync;

    /// Result of a successful try phase.
    type Output: Send;

    /// Name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Reserves resources.
    async fn try_action(&self, params: &Self::Params) -> Result<Self::Output, ActionError>;

    /// Commits the reserved resources.
    async fn confirm(&self, params: &Self::Params) -> Result<(), ActionError>;

    /// Releases the reserved resources.
    async fn cancel(&self, params: &Self::Params) -> Result<(), ActionError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{OrderEvent, OrderStateContext, OrderStateMachine, OrderStatus, StateMachine};

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Try.to_string(), "try");
        assert_eq!(Phase::Confirm.to_string(), "confirm");
        assert_eq!(Phase::Cancel.to_string(), "cancel");
    }

    #[test]
    fn test_state_machine_rejection_converts() {
        let mut ctx = OrderStateContext::new("order-1", OrderStatus::Cancelled);
        let err = OrderStateMachine::new()
            .send_event(OrderStatus::Cancelled, OrderEvent::Paid, &mut ctx)
            .unwrap_err();

        let action_err = ActionError::from(err);
        assert!(matches!(action_err, ActionError::Rejected(ref m) if m.contains("cancelled")));
    }
}
