//! Adapter over the authoritative remote relation store.
//!
//! This crate provides:
//! - RemoteRelationStore: the transactional apply contract
//! - HttpRelationStore: reqwest client delegating to a server-side
//!   transactional RPC
//! - MemoryRelationStore: in-process implementation of the same contract,
//!   with a connectivity switch, used as the test double across the
//!   workspace
//!
//! A single `apply` atomically reads the relation document's existence,
//! conditionally creates or deletes it, and adjusts the parent's aggregate
//! counter in the same transaction. Both branches of each idempotent pair
//! are no-ops, so replaying an apply never double-counts.

mod error;
mod http;
mod memory;
mod store;

pub use error::{RemoteStoreError, RemoteStoreResult};
pub use http::{HttpRelationStore, RemoteStoreConfig};
pub use memory::MemoryRelationStore;
pub use store::{RelationWrite, RemoteRelationStore};
