//! Per-attempt transition context and the audit record it produces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state_machine::{Event, Status, TransitionContext};

/// Transient context for one transition attempt on one entity.
///
/// Callers create a fresh context per attempt, pass it to
/// [`StateMachine::send_event`](crate::StateMachine::send_event) and, on
/// success, persist the new status themselves. `details` carries
/// entity-specific fields (for example the gateway transaction id of a
/// payment).
#[derive(Debug, Clone, PartialEq)]
pub struct StateContext<S, E, X = ()> {
    pub entity_id: String,
    pub current_status: S,
    pub old_status: Option<S>,
    pub new_status: Option<S>,
    pub event: Option<E>,
    pub reason: Option<String>,
    pub operator: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub details: X,
}

impl<S: Status, E: Event, X: Default> StateContext<S, E, X> {
    /// Creates a context for the entity currently in `current_status`.
    pub fn new(entity_id: impl Into<String>, current_status: S) -> Self {
        Self {
            entity_id: entity_id.into(),
            current_status,
            old_status: None,
            new_status: None,
            event: None,
            reason: None,
            operator: None,
            timestamp: Utc::now(),
            details: X::default(),
        }
    }
}

impl<S: Status, E: Event, X> StateContext<S, E, X> {
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    pub fn with_details(mut self, details: X) -> Self {
        self.details = details;
        self
    }

    /// Returns true once a transition has been accepted into this context.
    pub fn is_transitioned(&self) -> bool {
        self.new_status.is_some()
    }

    /// Builds the audit record of the accepted transition, if any.
    pub fn record(&self) -> Option<StateChangeRecord<S, E>> {
        Some(StateChangeRecord {
            entity_id: self.entity_id.clone(),
            old_status: self.old_status?,
            new_status: self.new_status?,
            event: self.event?,
            operator: self.operator.clone(),
            reason: self.reason.clone(),
            timestamp: self.timestamp,
        })
    }
}

impl<S: Status, E: Event, X> TransitionContext<S, E> for StateContext<S, E, X> {
    fn record_transition(&mut self, old_status: S, new_status: S, event: E) {
        self.old_status = Some(old_status);
        self.new_status = Some(new_status);
        self.event = Some(event);
        self.current_status = new_status;
        self.timestamp = Utc::now();
    }
}

/// Serializable state-log entry for one accepted transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChangeRecord<S, E> {
    pub entity_id: String,
    pub old_status: S,
    pub new_status: S,
    pub event: E,
    pub operator: Option<String>,
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{OrderEvent, OrderStatus};

    type Ctx = StateContext<OrderStatus, OrderEvent>;

    #[test]
    fn test_new_context_has_no_transition() {
        let ctx = Ctx::new("order-1", OrderStatus::PendingPayment);
        assert_eq!(ctx.current_status, OrderStatus::PendingPayment);
        assert!(!ctx.is_transitioned());
        assert!(ctx.record().is_none());
    }

    #[test]
    fn test_record_transition_fills_audit_fields() {
        let mut ctx = Ctx::new("order-1", OrderStatus::PendingPayment)
            .with_operator("system")
            .with_reason("paid via gateway");

        ctx.record_transition(
            OrderStatus::PendingPayment,
            OrderStatus::PendingShipment,
            OrderEvent::Paid,
        );

        assert!(ctx.is_transitioned());
        assert_eq!(ctx.current_status, OrderStatus::PendingShipment);

        let record = ctx.record().unwrap();
        assert_eq!(record.entity_id, "order-1");
        assert_eq!(record.old_status, OrderStatus::PendingPayment);
        assert_eq!(record.new_status, OrderStatus::PendingShipment);
        assert_eq!(record.event, OrderEvent::Paid);
        assert_eq!(record.operator.as_deref(), Some("system"));
        assert_eq!(record.reason.as_deref(), Some("paid via gateway"));
    }

    #[test]
    fn test_record_serialization() {
        let mut ctx = Ctx::new("order-7", OrderStatus::Shipped);
        ctx.record_transition(OrderStatus::Shipped, OrderStatus::Completed, OrderEvent::Receive);

        let json = serde_json::to_value(ctx.record().unwrap()).unwrap();
        assert_eq!(json["old_status"], "shipped");
        assert_eq!(json["new_status"], "completed");
        assert_eq!(json["event"], "RECEIVE");
        assert!(json["operator"].is_null());
    }
}
