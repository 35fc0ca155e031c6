//! Shared key-value store used by the distributed lock and the TCC ledger.
//!
//! The store offers plain get/set-with-TTL/delete plus a small set of atomic
//! scripts (set-if-absent, compare-and-delete, compare-and-set) that both
//! backends execute without a check-then-act race.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryKeyValueStore;
pub use postgres::PostgresKeyValueStore;
pub use store::{KeyValueStore, KeyValueStoreExt, ScriptCall, StoreScript};
