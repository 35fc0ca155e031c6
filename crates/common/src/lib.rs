//! Identifier types shared by the lock, store and TCC crates.

mod types;

pub use types::{HolderToken, TransactionId};
