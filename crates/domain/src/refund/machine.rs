//! Refund state machine.

use std::sync::LazyLock;

use crate::error::Result;
use crate::state_machine::{StateMachine, TransitionTable};

use super::{RefundEvent, RefundStateContext, RefundStatus};

static REFUND_TRANSITIONS: LazyLock<TransitionTable<RefundStatus, RefundEvent>> =
    LazyLock::new(|| {
        use RefundEvent::*;
        use RefundStatus::*;

        TransitionTable::builder("refund")
            .state(
                Pending,
                [
                    (Submit, Pending),
                    (Approve, Approved),
                    (Reject, Rejected),
                    (Cancel, Rejected),
                ],
            )
            .state(Approved, [(Process, Processing)])
            .state(Processing, [(Complete, Completed), (Fail, Failed)])
            .terminal(Rejected)
            .terminal(Completed)
            .terminal(Failed)
            .build()
    });

/// Decides refund status transitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefundStateMachine;

impl RefundStateMachine {
    pub fn new() -> Self {
        Self
    }

    pub fn table(&self) -> &'static TransitionTable<RefundStatus, RefundEvent> {
        &REFUND_TRANSITIONS
    }
}

impl StateMachine<RefundStatus, RefundEvent, RefundStateContext> for RefundStateMachine {
    fn send_event(
        &self,
        current: RefundStatus,
        event: RefundEvent,
        context: &mut RefundStateContext,
    ) -> Result<RefundStatus> {
        self.table().send_event(current, event, context)
    }

    fn can_transit(&self, current: RefundStatus, target: RefundStatus) -> bool {
        self.table().can_transit(current, target)
    }

    fn possible_next_states(&self, current: RefundStatus) -> Vec<RefundStatus> {
        self.table().possible_next_states(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refund::{OperatorType, RefundDetails};

    fn send(current: RefundStatus, event: RefundEvent) -> Result<RefundStatus> {
        let mut ctx = RefundStateContext::new("refund-1", current);
        RefundStateMachine::new().send_event(current, event, &mut ctx)
    }

    #[test]
    fn test_resubmission_stays_pending() {
        let mut ctx = RefundStateContext::new("refund-1", RefundStatus::Pending);
        let next = RefundStateMachine::new()
            .send_event(RefundStatus::Pending, RefundEvent::Submit, &mut ctx)
            .unwrap();

        assert_eq!(next, RefundStatus::Pending);
        assert_eq!(ctx.old_status, Some(RefundStatus::Pending));
        assert_eq!(ctx.new_status, Some(RefundStatus::Pending));
    }

    #[test]
    fn test_approval_path() {
        assert_eq!(
            send(RefundStatus::Pending, RefundEvent::Approve).unwrap(),
            RefundStatus::Approved
        );
        assert_eq!(
            send(RefundStatus::Approved, RefundEvent::Process).unwrap(),
            RefundStatus::Processing
        );
        assert_eq!(
            send(RefundStatus::Processing, RefundEvent::Complete).unwrap(),
            RefundStatus::Completed
        );
        assert_eq!(
            send(RefundStatus::Processing, RefundEvent::Fail).unwrap(),
            RefundStatus::Failed
        );
    }

    #[test]
    fn test_reject_and_cancel_both_reject() {
        assert_eq!(
            send(RefundStatus::Pending, RefundEvent::Reject).unwrap(),
            RefundStatus::Rejected
        );
        assert_eq!(
            send(RefundStatus::Pending, RefundEvent::Cancel).unwrap(),
            RefundStatus::Rejected
        );
    }

    #[test]
    fn test_approved_refund_cannot_be_cancelled() {
        assert!(send(RefundStatus::Approved, RefundEvent::Cancel).is_err());
        assert!(send(RefundStatus::Approved, RefundEvent::Complete).is_err());
    }

    #[test]
    fn test_pending_includes_itself_in_next_states() {
        let machine = RefundStateMachine::new();
        assert_eq!(
            machine.possible_next_states(RefundStatus::Pending),
            vec![
                RefundStatus::Pending,
                RefundStatus::Approved,
                RefundStatus::Rejected
            ]
        );
        assert!(machine.can_transit(RefundStatus::Pending, RefundStatus::Rejected));
        assert!(!machine.can_transit(RefundStatus::Pending, RefundStatus::Processing));
    }

    #[test]
    fn test_record_keeps_operator_details() {
        let mut ctx = RefundStateContext::new("refund-9", RefundStatus::Pending)
            .with_operator("alice")
            .with_reason("damaged on arrival")
            .with_details(RefundDetails {
                operator_type: Some(OperatorType::Admin),
                operator_id: Some(17),
            });

        RefundStateMachine::new()
            .send_event(RefundStatus::Pending, RefundEvent::Approve, &mut ctx)
            .unwrap();

        let record = ctx.record().unwrap();
        assert_eq!(record.new_status, RefundStatus::Approved);
        assert_eq!(record.operator.as_deref(), Some("alice"));
        assert_eq!(ctx.details.operator_type, Some(OperatorType::Admin));
        assert_eq!(ctx.details.operator_id, Some(17));
    }
}
