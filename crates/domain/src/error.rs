//! State machine error types.

use thiserror::Error;

/// Errors raised by the lifecycle state machines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateMachineError {
    /// The event is not accepted in the current status.
    #[error("{machine}: event {event} is not allowed in status '{state}'")]
    InvalidStateTransition {
        machine: &'static str,
        state: String,
        event: String,
    },
}

/// Result type for state machine operations.
pub type Result<T> = std::result::Result<T, StateMachineError>;
