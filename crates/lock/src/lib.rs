//! Distributed mutual exclusion over the shared key-value store.
//!
//! A lock is a store entry `key -> holder_token` with an expiry. Acquisition
//! and release are single atomic store scripts, so a caller can never
//! release a lock it does not hold, even after the lock expired and was
//! taken over by someone else.
//!
//! There is no fairness or queueing: under contention late arrivals may
//! starve. Callers that need ordering must provide it themselves.

pub mod config;
pub mod distributed;

pub use common::HolderToken;
pub use config::LockConfig;
pub use distributed::{DistributedLock, StoreLock};
