//! Cached and remote relation records.

use crate::{RelationId, RelationKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A locally cached relation record.
///
/// One row per relation id, created lazily on first toggle and never
/// deleted: "not liked" is `intended_state = false`, not absence. The row is
/// the complete local source of truth for status reads.
///
/// `pending` is true while the remote transaction for the last intent has
/// not been confirmed committed; pending rows are the sweeper's retry queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedRelation {
    /// Primary key (see [`RelationId::derive`]).
    pub id: RelationId,
    /// Acting user.
    pub subject_id: String,
    /// Target entity (post, comment, workout, or user).
    pub target_id: String,
    /// Owning parent id, for kinds whose counter lives on a parent entity.
    pub parent_id: Option<String>,
    /// Relation kind.
    pub kind: RelationKind,
    /// Last locally intended state; true means the relation should exist.
    pub intended_state: bool,
    /// True until the remote transaction for this intent is confirmed.
    pub pending: bool,
    /// Time of the last local write to this row.
    pub updated_at: DateTime<Utc>,
}

impl CachedRelation {
    /// Build the remote document payload for this relation.
    pub fn to_document(&self) -> RelationDocument {
        RelationDocument {
            subject_id: self.subject_id.clone(),
            target_id: self.target_id.clone(),
            parent_id: self.parent_id.clone(),
            created_at: Utc::now(),
        }
    }
}

/// The authoritative remote relation document.
///
/// Existence of this document at its derived path *is* the true state:
/// present means liked/saved/followed. Created on like, deleted on unlike,
/// always inside the same transaction that adjusts the parent's counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationDocument {
    /// Acting user.
    pub subject_id: String,
    /// Target entity.
    pub target_id: String,
    /// Owning parent id, when the kind is nested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// When the relation was created.
    pub created_at: DateTime<Utc>,
}
