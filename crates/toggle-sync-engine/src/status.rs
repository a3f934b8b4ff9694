//! Liked/not-liked view over a cache subscription.

use relation_cache::RelationWatch;

/// Live liked-state subscription for one relation.
///
/// Wraps the cache's relation watch and projects it to the boolean the UI
/// cares about: a missing cache entry reads as not liked. Values reflect
/// local intent, so they update the instant a toggle is recorded, before
/// the remote store has confirmed anything.
pub struct StatusWatch {
    inner: RelationWatch,
}

impl StatusWatch {
    pub(crate) fn new(inner: RelationWatch) -> Self {
        Self { inner }
    }

    /// Current liked state without waiting.
    pub fn current(&self) -> bool {
        self.inner
            .borrow()
            .as_ref()
            .map(|r| r.intended_state)
            .unwrap_or(false)
    }

    /// Wait for the next write to this relation and return the liked state
    /// after it. Returns `None` once the cache has been dropped.
    pub async fn next(&mut self) -> Option<bool> {
        self.inner.changed().await.ok()?;
        let liked = self
            .inner
            .borrow_and_update()
            .as_ref()
            .map(|r| r.intended_state)
            .unwrap_or(false);
        Some(liked)
    }
}
