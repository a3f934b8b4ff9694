//! In-process relation store implementing the transactional contract.

use crate::{RelationWrite, RemoteRelationStore, RemoteStoreError, RemoteStoreResult};
use async_trait::async_trait;
use relation_model::RelationDocument;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory relation store for tests.
///
/// Implements the five transaction branches under a single mutex, so every
/// apply is atomic exactly as the contract requires. A connectivity switch
/// (`set_online`) simulates network loss: while offline, applies fail and
/// nothing is mutated.
#[derive(Default)]
pub struct MemoryRelationStore {
    state: Mutex<MemoryState>,
}

struct MemoryState {
    online: bool,
    documents: HashMap<String, RelationDocument>,
    counters: HashMap<String, i64>,
    applies: usize,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            online: true,
            documents: HashMap::new(),
            counters: HashMap::new(),
            applies: 0,
        }
    }
}

impl MemoryRelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle simulated connectivity.
    pub fn set_online(&self, online: bool) {
        self.state.lock().expect("lock poisoned").online = online;
    }

    /// Whether a relation document exists at the write's path.
    pub fn document_exists(&self, write: &RelationWrite) -> bool {
        self.state
            .lock()
            .expect("lock poisoned")
            .documents
            .contains_key(&write.document_path())
    }

    /// Current value of a counter field on a document, 0 if never touched.
    pub fn counter(&self, counter_path: &str, field: &str) -> i64 {
        let state = self.state.lock().expect("lock poisoned");
        state
            .counters
            .get(&counter_key(counter_path, field))
            .copied()
            .unwrap_or(0)
    }

    /// Number of relation documents currently present.
    pub fn document_count(&self) -> usize {
        self.state.lock().expect("lock poisoned").documents.len()
    }

    /// Number of apply calls received, failed ones included.
    pub fn apply_count(&self) -> usize {
        self.state.lock().expect("lock poisoned").applies
    }
}

fn counter_key(counter_path: &str, field: &str) -> String {
    format!("{}#{}", counter_path, field)
}

#[async_trait]
impl RemoteRelationStore for MemoryRelationStore {
    async fn apply(&self, write: &RelationWrite) -> RemoteStoreResult<()> {
        let mut state = self.state.lock().expect("lock poisoned");
        state.applies += 1;
        if !state.online {
            return Err(RemoteStoreError::Offline);
        }

        let doc_path = write.document_path();
        let key = counter_key(&write.counter_path(), write.kind.counter_field());
        let exists = state.documents.contains_key(&doc_path);

        match (write.want_liked, exists) {
            (true, false) => {
                state.documents.insert(doc_path, write.document.clone());
                *state.counters.entry(key).or_insert(0) += 1;
            }
            (false, true) => {
                state.documents.remove(&doc_path);
                *state.counters.entry(key).or_insert(0) -= 1;
            }
            // Idempotent branches: duplicate like or unlike of an absent
            // relation changes nothing
            (true, true) | (false, false) => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use relation_model::{RelationId, RelationKind};

    fn make_write(subject: &str, target: &str, want_liked: bool) -> RelationWrite {
        RelationWrite {
            relation_id: RelationId::derive(subject, target, RelationKind::Post, None),
            kind: RelationKind::Post,
            target_id: target.to_string(),
            parent_id: None,
            want_liked,
            document: RelationDocument {
                subject_id: subject.to_string(),
                target_id: target.to_string(),
                parent_id: None,
                created_at: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn test_like_creates_document_and_increments() {
        let store = MemoryRelationStore::new();
        let write = make_write("u1", "p1", true);

        store.apply(&write).await.unwrap();

        assert!(store.document_exists(&write));
        assert_eq!(store.counter("posts/p1", "like_count"), 1);
    }

    #[tokio::test]
    async fn test_duplicate_like_is_noop() {
        let store = MemoryRelationStore::new();
        let write = make_write("u1", "p1", true);

        store.apply(&write).await.unwrap();
        store.apply(&write).await.unwrap();

        assert_eq!(store.counter("posts/p1", "like_count"), 1);
        assert_eq!(store.document_count(), 1);
    }

    #[tokio::test]
    async fn test_unlike_deletes_document_and_decrements() {
        let store = MemoryRelationStore::new();
        store.apply(&make_write("u1", "p1", true)).await.unwrap();

        let unlike = make_write("u1", "p1", false);
        store.apply(&unlike).await.unwrap();

        assert!(!store.document_exists(&unlike));
        assert_eq!(store.counter("posts/p1", "like_count"), 0);
    }

    #[tokio::test]
    async fn test_unlike_absent_is_noop() {
        let store = MemoryRelationStore::new();
        let write = make_write("u1", "p1", false);

        store.apply(&write).await.unwrap();
        store.apply(&write).await.unwrap();

        assert_eq!(store.counter("posts/p1", "like_count"), 0);
        assert_eq!(store.document_count(), 0);
    }

    #[tokio::test]
    async fn test_distinct_subjects_count_separately() {
        let store = MemoryRelationStore::new();
        store.apply(&make_write("u1", "p1", true)).await.unwrap();
        store.apply(&make_write("u2", "p1", true)).await.unwrap();

        assert_eq!(store.counter("posts/p1", "like_count"), 2);
        assert_eq!(store.document_count(), 2);
    }

    #[tokio::test]
    async fn test_offline_apply_fails_and_mutates_nothing() {
        let store = MemoryRelationStore::new();
        store.set_online(false);

        let write = make_write("u1", "p1", true);
        let result = store.apply(&write).await;

        assert!(matches!(result, Err(RemoteStoreError::Offline)));
        assert!(!store.document_exists(&write));
        assert_eq!(store.counter("posts/p1", "like_count"), 0);
        assert_eq!(store.apply_count(), 1);

        // Back online, the same write succeeds
        store.set_online(true);
        store.apply(&write).await.unwrap();
        assert_eq!(store.counter("posts/p1", "like_count"), 1);
    }

    #[tokio::test]
    async fn test_comment_like_adjusts_nested_comment_counter() {
        let store = MemoryRelationStore::new();
        let write = RelationWrite {
            relation_id: RelationId::derive("u1", "c9", RelationKind::Comment, Some("p1")),
            kind: RelationKind::Comment,
            target_id: "c9".to_string(),
            parent_id: Some("p1".to_string()),
            want_liked: true,
            document: RelationDocument {
                subject_id: "u1".to_string(),
                target_id: "c9".to_string(),
                parent_id: Some("p1".to_string()),
                created_at: Utc::now(),
            },
        };

        store.apply(&write).await.unwrap();
        assert_eq!(store.counter("posts/p1/comments/c9", "like_count"), 1);
    }
}
