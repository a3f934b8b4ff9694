//! Value types for toggleable relations.
//!
//! A relation is a boolean fact linking a subject (the acting user) to a
//! target entity under a kind: "u1 likes post p1", "u2 saved workout w3".
//! This crate provides:
//! - RelationKind: the closed set of relation kinds and their remote layout
//! - RelationId: deterministic identifier derived from the relation key
//! - CachedRelation: the locally cached record with intent and pending flag
//! - RelationDocument: the authoritative remote document payload
//!
//! Everything here is pure data; storage and networking live in
//! `relation-cache` and `remote-relation-store`.

mod id;
mod kind;
mod relation;

pub use id::RelationId;
pub use kind::RelationKind;
pub use relation::{CachedRelation, RelationDocument};
