use thiserror::Error;

/// Errors that can occur when interacting with the key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write was attempted with a TTL shorter than one millisecond.
    #[error("Invalid TTL for key {key}: must be at least 1 ms")]
    InvalidTtl { key: String },

    /// A script was evaluated with the wrong keys or arguments.
    #[error("Invalid arguments for script {script}: {reason}")]
    InvalidScriptArguments {
        script: &'static str,
        reason: String,
    },

    /// The store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
