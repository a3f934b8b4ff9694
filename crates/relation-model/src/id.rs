//! Deterministic relation identifiers.

use crate::RelationKind;
use serde::{Deserialize, Serialize};

/// Deterministic identifier for a relation.
///
/// Derived from `(subject, target, kind, parent)` by kind-tagged
/// concatenation; identical inputs always produce the identical id. The id
/// doubles as the cache primary key and the remote document id, which is what
/// makes retries idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationId(String);

impl RelationId {
    /// Derive the id for a relation key.
    ///
    /// Pure and total: no validation happens here, the engine checks subject
    /// and parent requirements before deriving. Component ids are already
    /// unique opaque strings, so a delimited concatenation is collision-free
    /// for the cardinality of real data.
    pub fn derive(
        subject_id: &str,
        target_id: &str,
        kind: RelationKind,
        parent_id: Option<&str>,
    ) -> Self {
        let id = match parent_id {
            Some(parent) => format!("{}:{}:{}:{}", kind.as_str(), subject_id, target_id, parent),
            None => format!("{}:{}:{}", kind.as_str(), subject_id, target_id),
        };
        RelationId(id)
    }

    /// Wrap an already-derived id (e.g. read back from the cache).
    pub fn from_string(id: impl Into<String>) -> Self {
        RelationId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_is_deterministic() {
        let a = RelationId::derive("u1", "p1", RelationKind::Post, None);
        let b = RelationId::derive("u1", "p1", RelationKind::Post, None);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "post:u1:p1");
    }

    #[test]
    fn test_kind_distinguishes_ids() {
        let like = RelationId::derive("u1", "w1", RelationKind::Workout, None);
        let save = RelationId::derive("u1", "w1", RelationKind::WorkoutSave, None);
        assert_ne!(like, save);
    }

    #[test]
    fn test_parent_included_when_present() {
        let id = RelationId::derive("u1", "c9", RelationKind::Comment, Some("p1"));
        assert_eq!(id.as_str(), "comment:u1:c9:p1");
    }

    #[test]
    fn test_subject_and_target_not_interchangeable() {
        let a = RelationId::derive("u1", "u2", RelationKind::Follow, None);
        let b = RelationId::derive("u2", "u1", RelationKind::Follow, None);
        assert_ne!(a, b);
    }
}
