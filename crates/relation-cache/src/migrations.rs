//! Cache schema migrations.
//!
//! Migrations are run in order and tracked in the `migrations` table.

use crate::{CacheError, CacheResult};
use rusqlite::Connection;
use tracing::{debug, info};

/// Current schema version.
pub const CURRENT_VERSION: i32 = 1;

/// Run all pending migrations.
pub fn run_migrations(conn: &Connection) -> CacheResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    // A database written by a newer build cannot be downgraded safely
    if current_version > CURRENT_VERSION {
        return Err(CacheError::Migration(format!(
            "cache schema version {} is newer than supported version {}",
            current_version, CURRENT_VERSION
        )));
    }

    info!(current_version, target_version = CURRENT_VERSION, "Running cache migrations");

    if current_version < 1 {
        migrate_v1_relations(conn)?;
    }

    Ok(())
}

fn record_migration(conn: &Connection, version: i32, name: &str) -> CacheResult<()> {
    conn.execute(
        "INSERT INTO migrations (version, name) VALUES (?1, ?2)",
        rusqlite::params![version, name],
    )?;
    debug!(version, name, "Migration applied");
    Ok(())
}

/// V1: relations table keyed by derived relation id.
fn migrate_v1_relations(conn: &Connection) -> CacheResult<()> {
    info!("Applying migration v1: relations");

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS relations (
            id TEXT PRIMARY KEY,
            subject_id TEXT NOT NULL,
            target_id TEXT NOT NULL,
            parent_id TEXT,
            kind TEXT NOT NULL,
            intended_state INTEGER NOT NULL,
            pending INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_relations_pending
            ON relations(pending);
        CREATE INDEX IF NOT EXISTS idx_relations_subject
            ON relations(subject_id);
        ",
    )?;

    record_migration(conn, 1, "relations")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_run_successfully() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"relations".to_string()));
        assert!(tables.contains(&"migrations".to_string()));
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version: i32 = conn
            .query_row("SELECT MAX(version) FROM migrations", [], |row| row.get(0))
            .unwrap();

        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_newer_schema_version_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO migrations (version, name) VALUES (?1, ?2)",
            rusqlite::params![99, "future"],
        )
        .unwrap();

        let err = run_migrations(&conn).unwrap_err();
        assert!(matches!(err, CacheError::Migration(_)));
    }
}
