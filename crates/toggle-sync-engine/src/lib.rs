//! Optimistic local/remote toggle-synchronization engine.
//!
//! The engine keeps all liked/saved/followed state in agreement between a
//! durable local cache and the authoritative remote store:
//!
//! - [`ToggleEngine::toggle`] flips the last locally intended state, writes
//!   it durably with a pending marker, then runs the remote transaction and
//!   confirms. A failed remote call leaves the optimistic value in place
//!   for later replay.
//! - [`ToggleEngine::sync_pending`] replays every still-pending intent,
//!   invoked by the host on startup and on connectivity recovery.
//! - [`ToggleEngine::observe_status`] / [`ToggleEngine::get_status`] read
//!   purely from the local cache and never touch the network.
//!
//! Operations on the same relation id are serialized through a per-id lock;
//! unrelated relations proceed fully in parallel.

mod engine;
mod error;
mod status;

pub use engine::{SyncReport, ToggleEngine};
pub use error::{EngineError, EngineResult};
pub use status::StatusWatch;
