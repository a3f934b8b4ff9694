//! SQLite-backed relation cache with change subscription.

use crate::{migrations, CacheError, CacheResult};
use chrono::{DateTime, Utc};
use relation_model::{CachedRelation, RelationId, RelationKind};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tokio::sync::watch;
use tracing::debug;

/// Live subscription to a single relation id.
///
/// Carries the current value at subscription time (`borrow()`) and resolves
/// `changed()` on every subsequent `put` to that id. Receivers are
/// independent: dropping one never affects other observers of the same id.
pub type RelationWatch = watch::Receiver<Option<CachedRelation>>;

/// Local durable store of relation records, keyed by relation id.
///
/// The toggle coordinator talks to the cache through this trait, so tests
/// can substitute failing or instrumented implementations for the SQLite
/// one.
pub trait RelationCache: Send + Sync {
    /// Point lookup by relation id. Missing rows are `None`, not an error.
    fn get(&self, id: &RelationId) -> CacheResult<Option<CachedRelation>>;

    /// Upsert a relation row; durable before returning.
    ///
    /// Observers of the row's id are notified after the commit, so a watcher
    /// never sees a value that could be lost to a crash.
    fn put(&self, relation: &CachedRelation) -> CacheResult<()>;

    /// All rows still marked pending, oldest first. Used by the sweeper.
    fn list_pending(&self) -> CacheResult<Vec<CachedRelation>>;

    /// Subscribe to changes of a single relation id.
    ///
    /// The returned watch carries the current cache value immediately and is
    /// notified on every subsequent `put` to the same id. Observers of the
    /// same id share one channel; unrelated ids never emit.
    fn observe(&self, id: &RelationId) -> CacheResult<RelationWatch>;
}

/// Durable SQLite cache of relation records.
///
/// All writes are committed to SQLite before `put` returns; a confirmed put
/// with `pending = true` is what survives a crash mid-toggle. Reads and
/// writes take a short-lived connection lock; observers are served from
/// watch channels and never wait on the database.
pub struct SqliteRelationCache {
    conn: Mutex<Connection>,
    /// One watch channel per observed relation id, created lazily and kept
    /// for the cache lifetime (relation rows are never deleted either).
    watchers: Mutex<HashMap<String, watch::Sender<Option<CachedRelation>>>>,
}

impl SqliteRelationCache {
    /// Open a cache at the given path, running migrations if needed.
    pub fn open(path: &Path) -> CacheResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL mode so a committed put is durable without blocking readers
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        migrations::run_migrations(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            watchers: Mutex::new(HashMap::new()),
        })
    }

    /// Open an in-memory cache for testing.
    pub fn open_in_memory() -> CacheResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            watchers: Mutex::new(HashMap::new()),
        })
    }

    /// Number of rows still marked pending.
    pub fn pending_count(&self) -> CacheResult<usize> {
        let conn = self.conn.lock().expect("lock poisoned");
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM relations WHERE pending = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

impl RelationCache for SqliteRelationCache {
    fn get(&self, id: &RelationId) -> CacheResult<Option<CachedRelation>> {
        let conn = self.conn.lock().expect("lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, subject_id, target_id, parent_id, kind, intended_state, pending, updated_at
             FROM relations WHERE id = ?1",
        )?;

        let result = stmt.query_row(params![id.as_str()], map_raw_row);

        match result {
            Ok(raw) => Ok(Some(raw.into_relation()?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, relation: &CachedRelation) -> CacheResult<()> {
        {
            let conn = self.conn.lock().expect("lock poisoned");
            conn.execute(
                "INSERT INTO relations (id, subject_id, target_id, parent_id, kind, intended_state, pending, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(id) DO UPDATE SET
                    intended_state = ?6,
                    pending = ?7,
                    updated_at = ?8",
                params![
                    relation.id.as_str(),
                    relation.subject_id,
                    relation.target_id,
                    relation.parent_id,
                    relation.kind.as_str(),
                    relation.intended_state,
                    relation.pending,
                    relation.updated_at.to_rfc3339(),
                ],
            )?;
        }

        debug!(
            relation_id = %relation.id,
            intended_state = relation.intended_state,
            pending = relation.pending,
            "Relation row written"
        );

        let watchers = self.watchers.lock().expect("lock poisoned");
        if let Some(sender) = watchers.get(relation.id.as_str()) {
            // send_replace marks the channel changed even for equal values,
            // so every put reaches every observer
            sender.send_replace(Some(relation.clone()));
        }

        Ok(())
    }

    fn list_pending(&self) -> CacheResult<Vec<CachedRelation>> {
        let conn = self.conn.lock().expect("lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, subject_id, target_id, parent_id, kind, intended_state, pending, updated_at
             FROM relations WHERE pending = 1 ORDER BY updated_at ASC",
        )?;

        let raws = stmt
            .query_map([], map_raw_row)?
            .collect::<Result<Vec<_>, _>>()?;

        raws.into_iter().map(RawRelation::into_relation).collect()
    }

    fn observe(&self, id: &RelationId) -> CacheResult<RelationWatch> {
        let mut watchers = self.watchers.lock().expect("lock poisoned");
        if let Some(sender) = watchers.get(id.as_str()) {
            return Ok(sender.subscribe());
        }

        // First observer for this id: seed the channel from the database
        // while holding the watcher lock, so a concurrent put cannot slip
        // between the read and the channel registration.
        let current = self.get(id)?;
        let (sender, receiver) = watch::channel(current);
        watchers.insert(id.as_str().to_string(), sender);
        debug!(relation_id = %id, "Relation watch created");
        Ok(receiver)
    }
}

/// Cache double whose writes always fail.
///
/// Stands in for a cache hitting disk errors (full disk, corruption), so
/// consumers can exercise their local-write failure paths. Reads succeed
/// and report an empty cache.
#[derive(Default)]
pub struct FailingRelationCache {
    senders: Mutex<Vec<watch::Sender<Option<CachedRelation>>>>,
}

impl FailingRelationCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RelationCache for FailingRelationCache {
    fn get(&self, _id: &RelationId) -> CacheResult<Option<CachedRelation>> {
        Ok(None)
    }

    fn put(&self, _relation: &CachedRelation) -> CacheResult<()> {
        Err(CacheError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk full",
        )))
    }

    fn list_pending(&self) -> CacheResult<Vec<CachedRelation>> {
        Ok(Vec::new())
    }

    fn observe(&self, _id: &RelationId) -> CacheResult<RelationWatch> {
        let (sender, receiver) = watch::channel(None);
        // Keep the sender so the watch stays open
        self.senders.lock().expect("lock poisoned").push(sender);
        Ok(receiver)
    }
}

/// Raw row before kind/timestamp conversion.
struct RawRelation {
    id: String,
    subject_id: String,
    target_id: String,
    parent_id: Option<String>,
    kind: String,
    intended_state: bool,
    pending: bool,
    updated_at: String,
}

impl RawRelation {
    fn into_relation(self) -> CacheResult<CachedRelation> {
        let kind = RelationKind::from_str(&self.kind)
            .ok_or_else(|| CacheError::InvalidData(format!("unknown relation kind: {}", self.kind)))?;
        Ok(CachedRelation {
            id: RelationId::from_string(self.id),
            subject_id: self.subject_id,
            target_id: self.target_id,
            parent_id: self.parent_id,
            kind,
            intended_state: self.intended_state,
            pending: self.pending,
            updated_at: parse_datetime(self.updated_at),
        })
    }
}

fn map_raw_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRelation> {
    Ok(RawRelation {
        id: row.get(0)?,
        subject_id: row.get(1)?,
        target_id: row.get(2)?,
        parent_id: row.get(3)?,
        kind: row.get(4)?,
        intended_state: row.get(5)?,
        pending: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Parse an RFC3339 datetime string, falling back to current time on error.
fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
