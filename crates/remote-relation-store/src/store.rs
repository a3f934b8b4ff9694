//! The transactional apply contract.

use crate::RemoteStoreResult;
use async_trait::async_trait;
use relation_model::{RelationDocument, RelationId, RelationKind};

/// One atomic write against the remote store.
///
/// Describes the desired existence state of a relation document together
/// with the counter document it affects. The derived relation id is reused
/// as the remote document id, which is what makes replays idempotent.
#[derive(Debug, Clone)]
pub struct RelationWrite {
    /// Relation id, also the remote document id.
    pub relation_id: RelationId,
    /// Relation kind; selects collection and counter field.
    pub kind: RelationKind,
    /// Target entity id.
    pub target_id: String,
    /// Owning parent id for nested kinds.
    pub parent_id: Option<String>,
    /// Desired existence state: true = document should exist.
    pub want_liked: bool,
    /// Document payload written on create.
    pub document: RelationDocument,
}

impl RelationWrite {
    /// Path of the relation document inside its kind's collection.
    pub fn document_path(&self) -> String {
        format!("{}/{}", self.kind.collection(), self.relation_id)
    }

    /// Path of the document carrying the aggregate counter.
    ///
    /// The counter lives on the target entity itself; nested kinds address
    /// it through the owning parent (`posts/{parent}/comments/{target}`).
    pub fn counter_path(&self) -> String {
        match (self.kind.nested_collection(), self.parent_id.as_deref()) {
            (Some(nested), Some(parent)) => format!(
                "{}/{}/{}/{}",
                self.kind.parent_collection(),
                parent,
                nested,
                self.target_id
            ),
            _ => format!("{}/{}", self.kind.parent_collection(), self.target_id),
        }
    }
}

/// Transactional apply against the authoritative store.
///
/// Implementations must execute all of the following atomically, with full
/// commit or full abort:
/// 1. Read existence of the relation document at `document_path()`.
/// 2. `want_liked` and absent: create it, increment the counter by 1.
/// 3. `want_liked` and present: no-op.
/// 4. `!want_liked` and present: delete it, decrement the counter by 1.
/// 5. `!want_liked` and absent: no-op.
///
/// Timeouts must surface as errors; the caller never assumes success.
#[async_trait]
pub trait RemoteRelationStore: Send + Sync {
    /// Execute one atomic relation write.
    async fn apply(&self, write: &RelationWrite) -> RemoteStoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_write(kind: RelationKind, target: &str, parent: Option<&str>) -> RelationWrite {
        RelationWrite {
            relation_id: RelationId::derive("u1", target, kind, parent),
            kind,
            target_id: target.to_string(),
            parent_id: parent.map(str::to_string),
            want_liked: true,
            document: RelationDocument {
                subject_id: "u1".to_string(),
                target_id: target.to_string(),
                parent_id: parent.map(str::to_string),
                created_at: Utc::now(),
            },
        }
    }

    #[test]
    fn test_document_path_uses_kind_collection() {
        let write = make_write(RelationKind::Post, "p1", None);
        assert_eq!(write.document_path(), "post_likes/post:u1:p1");
    }

    #[test]
    fn test_counter_path_for_flat_kind_uses_target() {
        let write = make_write(RelationKind::Workout, "w1", None);
        assert_eq!(write.counter_path(), "workouts/w1");
    }

    #[test]
    fn test_counter_path_for_comment_is_nested_under_post() {
        let write = make_write(RelationKind::Comment, "c9", Some("p1"));
        assert_eq!(write.counter_path(), "posts/p1/comments/c9");
    }

    #[test]
    fn test_post_and_comment_counters_never_collide() {
        let post = make_write(RelationKind::Post, "p1", None);
        let comment = make_write(RelationKind::Comment, "c9", Some("p1"));
        assert_ne!(post.counter_path(), comment.counter_path());
    }
}
