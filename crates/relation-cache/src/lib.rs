//! Durable local cache of relation records.
//!
//! This crate provides:
//! - RelationCache: the local store contract consumers depend on
//! - SqliteRelationCache: SQLite-backed implementation with crash
//!   durability, versioned migrations tracked in a `migrations` table, and
//!   per-id change subscription via `tokio::sync::watch` fan-out
//! - FailingRelationCache: double whose writes fail, for exercising
//!   local-write error paths in consumers
//!
//! The cache stores one row per relation id carrying the last locally
//! intended state and a pending flag. A confirmed `put` is the durability
//! guarantee the toggle coordinator relies on before touching the network:
//! if the process dies mid-toggle, the pending row survives and is replayed
//! by the reconciliation sweeper.

mod cache;
mod error;
mod migrations;

pub use cache::{FailingRelationCache, RelationCache, RelationWatch, SqliteRelationCache};
pub use error::{CacheError, CacheResult};
pub use migrations::run_migrations;
