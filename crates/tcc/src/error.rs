//! TCC error types.

use common::TransactionId;
use kv_store::StoreError;
use thiserror::Error;

use crate::action::{ActionError, Phase};
use crate::status::TransactionStatus;

/// Errors that can occur during TCC transaction operations.
#[derive(Debug, Error)]
pub enum TccError {
    /// Another caller holds the transaction lock. Transient.
    #[error("Failed to acquire lock for transaction {transaction_id}")]
    LockAcquisitionFailed { transaction_id: TransactionId },

    /// The transaction is unknown or has expired.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// The transaction's status does not allow the requested phase.
    #[error("Cannot {phase} transaction {transaction_id} in status {status}")]
    InvalidState {
        transaction_id: TransactionId,
        phase: Phase,
        status: TransactionStatus,
    },

    /// The business phase failed; confirm/cancel may be retried.
    #[error(
        "{phase} phase failed for transaction {transaction_id} (retry {retry_count}/{max_retry_count}): {source}"
    )]
    PhaseExecutionFailed {
        transaction_id: TransactionId,
        phase: Phase,
        retry_count: u32,
        max_retry_count: u32,
        #[source]
        source: ActionError,
    },

    /// Confirm/cancel failed `max_retry_count` times; needs manual remediation.
    #[error(
        "{phase} phase for transaction {transaction_id} exhausted {retry_count}/{max_retry_count} retries"
    )]
    RetriesExhausted {
        transaction_id: TransactionId,
        phase: Phase,
        retry_count: u32,
        max_retry_count: u32,
        last_error: Option<String>,
    },

    /// Encoding or decoding the transaction record or its params failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The shared store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl TccError {
    /// Returns true for failures a caller may retry as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TccError::LockAcquisitionFailed { .. }
                | TccError::PhaseExecutionFailed { .. }
                | TccError::Store(_)
        )
    }
}

/// Convenience type alias for TCC results.
pub type Result<T> = std::result::Result<T, TccError>;
