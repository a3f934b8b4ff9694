//! Toggle coordinator, pending-intent sweeper, and status reads.

use crate::{EngineError, EngineResult, StatusWatch};
use chrono::Utc;
use relation_cache::RelationCache;
use relation_model::{CachedRelation, RelationId, RelationKind};
use remote_relation_store::{RelationWrite, RemoteRelationStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

/// Outcome of one sweeper pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Entries confirmed against the remote store.
    pub synced: usize,
    /// Entries that failed and remain queued.
    pub failed: usize,
}

/// Coordinates toggles between the local cache and the remote store.
///
/// Every toggle is recorded durably in the cache first (optimistic, marked
/// pending), then pushed through the remote store's atomic apply and
/// confirmed. Failed pushes leave the pending row in place; the cache is
/// the retry queue and [`ToggleEngine::sync_pending`] drains it.
///
/// Work on a single relation id is serialized through a per-id async lock
/// so a rapid double tap becomes two ordered flips, never a race. Locks are
/// created lazily and kept for the engine lifetime, mirroring the cache's
/// watch channels.
pub struct ToggleEngine {
    cache: Arc<dyn RelationCache>,
    remote: Arc<dyn RemoteRelationStore>,
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ToggleEngine {
    pub fn new(cache: Arc<dyn RelationCache>, remote: Arc<dyn RemoteRelationStore>) -> Self {
        Self {
            cache,
            remote,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Flip the liked state of a relation.
    ///
    /// The new intent is derived from the last locally recorded one, not
    /// from the remote store, so toggles stay correct offline. Returns the
    /// new local intent. On a remote failure the optimistic value stays in
    /// the cache (still pending) and the error is surfaced so the caller
    /// can tell confirmed from queued.
    pub async fn toggle(
        &self,
        subject_id: &str,
        target_id: &str,
        kind: RelationKind,
        parent_id: Option<&str>,
    ) -> EngineResult<bool> {
        validate(subject_id, kind, parent_id)?;

        let id = RelationId::derive(subject_id, target_id, kind, parent_id);
        let lock = self.lock_for(&id);
        let _guard = lock.lock().await;

        let want = !self
            .cache
            .get(&id)?
            .map(|r| r.intended_state)
            .unwrap_or(false);

        let relation = CachedRelation {
            id: id.clone(),
            subject_id: subject_id.to_string(),
            target_id: target_id.to_string(),
            parent_id: parent_id.map(str::to_string),
            kind,
            intended_state: want,
            pending: true,
            updated_at: Utc::now(),
        };
        self.cache.put(&relation)?;
        debug!(relation_id = %id, intended_state = want, "Toggle recorded locally");

        match self.replay(&relation).await {
            Ok(()) => Ok(want),
            Err(e) => {
                warn!(relation_id = %id, error = %e, "Remote transaction failed, intent queued");
                Err(e)
            }
        }
    }

    /// Replay every still-pending intent against the remote store.
    ///
    /// Called by the host on startup and whenever connectivity returns.
    /// Entries are independent; a failure is logged, counted, and never
    /// blocks the remaining entries. Each entry is re-read under its lock
    /// before replay in case a toggle superseded it while it waited.
    pub async fn sync_pending(&self) -> EngineResult<SyncReport> {
        let pending = self.cache.list_pending()?;
        if pending.is_empty() {
            return Ok(SyncReport::default());
        }

        info!(count = pending.len(), "Replaying pending relation intents");
        let mut report = SyncReport::default();

        for entry in pending {
            let lock = self.lock_for(&entry.id);
            let _guard = lock.lock().await;

            let current = match self.cache.get(&entry.id) {
                Ok(Some(current)) if current.pending => current,
                Ok(_) => continue,
                Err(e) => {
                    warn!(relation_id = %entry.id, error = %e, "Skipping unreadable pending entry");
                    report.failed += 1;
                    continue;
                }
            };

            match self.replay(&current).await {
                Ok(()) => report.synced += 1,
                Err(e) => {
                    warn!(relation_id = %current.id, error = %e, "Pending replay failed");
                    report.failed += 1;
                }
            }
        }

        info!(
            synced = report.synced,
            failed = report.failed,
            "Pending replay finished"
        );
        Ok(report)
    }

    /// Point read of the liked state. Local only, never touches the network.
    pub fn get_status(
        &self,
        subject_id: &str,
        target_id: &str,
        kind: RelationKind,
        parent_id: Option<&str>,
    ) -> EngineResult<bool> {
        validate(subject_id, kind, parent_id)?;
        let id = RelationId::derive(subject_id, target_id, kind, parent_id);
        Ok(self
            .cache
            .get(&id)?
            .map(|r| r.intended_state)
            .unwrap_or(false))
    }

    /// Subscribe to the liked state of a relation.
    ///
    /// The watch carries the current local value immediately and updates on
    /// every toggle for the same relation, including optimistic writes that
    /// have not reached the remote store yet.
    pub fn observe_status(
        &self,
        subject_id: &str,
        target_id: &str,
        kind: RelationKind,
        parent_id: Option<&str>,
    ) -> EngineResult<StatusWatch> {
        validate(subject_id, kind, parent_id)?;
        let id = RelationId::derive(subject_id, target_id, kind, parent_id);
        Ok(StatusWatch::new(self.cache.observe(&id)?))
    }

    /// Push one recorded intent through the remote store and confirm it.
    async fn replay(&self, relation: &CachedRelation) -> EngineResult<()> {
        let write = RelationWrite {
            relation_id: relation.id.clone(),
            kind: relation.kind,
            target_id: relation.target_id.clone(),
            parent_id: relation.parent_id.clone(),
            want_liked: relation.intended_state,
            document: relation.to_document(),
        };
        self.remote.apply(&write).await?;

        let confirmed = CachedRelation {
            pending: false,
            updated_at: Utc::now(),
            ..relation.clone()
        };
        self.cache.put(&confirmed)?;
        debug!(relation_id = %confirmed.id, "Relation confirmed remotely");
        Ok(())
    }

    fn lock_for(&self, id: &RelationId) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().expect("lock poisoned");
        locks
            .entry(id.as_str().to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

fn validate(subject_id: &str, kind: RelationKind, parent_id: Option<&str>) -> EngineResult<()> {
    if subject_id.is_empty() {
        return Err(EngineError::NotAuthenticated);
    }
    if kind.requires_parent() && parent_id.is_none() {
        return Err(EngineError::InvalidRelation(format!(
            "{} relations need a parent id",
            kind
        )));
    }
    Ok(())
}
