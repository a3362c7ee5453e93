//! Durable ledger of fully processed (show, article) pairs.
//!
//! Backed by a single SQLite table with a uniqueness constraint on the
//! processing key. A record exists only for entries whose pipeline ran to
//! full success, so membership implies the entry never needs reprocessing.
//! Duplicate marks are silent no-ops, keeping re-runs safe.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use tracing::info;

/// Errors from the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration source error: {0}")]
    MigrationSource(#[from] std::io::Error),

    #[error("migration parse error: {0}")]
    MigrationParse(#[from] serde_json::Error),
}

/// One ledger record, as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRecord {
    pub show_id: String,
    pub article_id: String,
    pub title: Option<String>,
    pub feed_name: Option<String>,
    pub processed_at: String,
}

/// SQLite-backed idempotency ledger.
///
/// The connection is mutex-guarded so check-and-mark stays atomic per key
/// even if callers ever process feeds concurrently.
pub struct Ledger {
    conn: Mutex<Connection>,
}

impl Ledger {
    /// Open (and initialize if needed) the ledger at the given path.
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory ledger (tests).
    pub fn open_in_memory() -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), LedgerError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS processed_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                show_id TEXT NOT NULL,
                article_id TEXT NOT NULL,
                title TEXT,
                feed_name TEXT,
                processed_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(show_id, article_id)
            )",
        )?;
        Ok(())
    }

    /// Check whether an article has already been processed for a show.
    pub fn is_processed(&self, show_id: &str, article_id: &str) -> Result<bool, LedgerError> {
        let conn = self.conn.lock().expect("ledger mutex poisoned");
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM processed_items WHERE show_id = ?1 AND article_id = ?2",
                params![show_id, article_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Mark an article processed for a show.
    ///
    /// Insert-on-conflict is a no-op: returns true if a new record was
    /// created, false if the key was already present.
    pub fn mark_processed(
        &self,
        show_id: &str,
        article_id: &str,
        title: Option<&str>,
        feed_name: Option<&str>,
    ) -> Result<bool, LedgerError> {
        let conn = self.conn.lock().expect("ledger mutex poisoned");
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO processed_items (show_id, article_id, title, feed_name)
             VALUES (?1, ?2, ?3, ?4)",
            params![show_id, article_id, title, feed_name],
        )?;
        Ok(inserted > 0)
    }

    /// Number of processed items, optionally filtered by show.
    pub fn processed_count(&self, show_id: Option<&str>) -> Result<u64, LedgerError> {
        let conn = self.conn.lock().expect("ledger mutex poisoned");
        let count: i64 = match show_id {
            Some(id) => conn.query_row(
                "SELECT COUNT(*) FROM processed_items WHERE show_id = ?1",
                params![id],
                |row| row.get(0),
            )?,
            None => conn.query_row("SELECT COUNT(*) FROM processed_items", [], |row| row.get(0))?,
        };
        Ok(count as u64)
    }

    /// Distinct show ids present in the ledger with their counts.
    pub fn counts_by_show(&self) -> Result<Vec<(String, u64)>, LedgerError> {
        let conn = self.conn.lock().expect("ledger mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT show_id, COUNT(*) FROM processed_items GROUP BY show_id ORDER BY show_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?;
        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }

    /// Fetch a record by key (diagnostics and tests).
    pub fn get(
        &self,
        show_id: &str,
        article_id: &str,
    ) -> Result<Option<LedgerRecord>, LedgerError> {
        let conn = self.conn.lock().expect("ledger mutex poisoned");
        let record = conn
            .query_row(
                "SELECT show_id, article_id, title, feed_name, processed_at
                 FROM processed_items WHERE show_id = ?1 AND article_id = ?2",
                params![show_id, article_id],
                |row| {
                    Ok(LedgerRecord {
                        show_id: row.get(0)?,
                        article_id: row.get(1)?,
                        title: row.get(2)?,
                        feed_name: row.get(3)?,
                        processed_at: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }
}

/// Show id that legacy records are migrated under.
pub const LEGACY_SHOW_ID: &str = "legacy";

/// One-time migration of a legacy `processed.json` file into the ledger.
///
/// The legacy format was a flat map of item id to a truthy flag, with no
/// show dimension; migrated records land under the synthetic `legacy` show.
/// The source file is renamed to `<name>.bak` afterward so the migration
/// never runs twice.
pub fn migrate_legacy_file(ledger: &Ledger, path: &Path) -> Result<usize, LedgerError> {
    if !path.exists() {
        info!(path = %path.display(), "no legacy file found, nothing to migrate");
        return Ok(0);
    }

    let content = std::fs::read_to_string(path)?;
    let processed: HashMap<String, bool> = serde_json::from_str(&content)?;

    info!(items = processed.len(), "found legacy processed items");

    let mut migrated = 0;
    for (item_id, done) in &processed {
        if *done && ledger.mark_processed(LEGACY_SHOW_ID, item_id, None, None)? {
            migrated += 1;
        }
    }

    // Rename rather than delete so the original is recoverable.
    let backup: PathBuf = path.with_extension("json.bak");
    std::fs::rename(path, &backup)?;
    info!(backup = %backup.display(), migrated, "legacy migration complete");

    Ok(migrated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_check() {
        let ledger = Ledger::open_in_memory().unwrap();

        assert!(!ledger.is_processed("show", "item-1").unwrap());
        assert!(ledger
            .mark_processed("show", "item-1", Some("Title"), Some("Feed"))
            .unwrap());
        assert!(ledger.is_processed("show", "item-1").unwrap());
    }

    #[test]
    fn test_duplicate_mark_is_noop() {
        let ledger = Ledger::open_in_memory().unwrap();

        assert!(ledger.mark_processed("show", "item", None, None).unwrap());
        assert!(!ledger.mark_processed("show", "item", None, None).unwrap());
        assert_eq!(ledger.processed_count(Some("show")).unwrap(), 1);
    }

    #[test]
    fn test_record_fields() {
        let ledger = Ledger::open_in_memory().unwrap();
        ledger
            .mark_processed("show", "item", Some("A Title"), Some("A Feed"))
            .unwrap();

        let record = ledger.get("show", "item").unwrap().unwrap();
        assert_eq!(record.title.as_deref(), Some("A Title"));
        assert_eq!(record.feed_name.as_deref(), Some("A Feed"));
        assert!(!record.processed_at.is_empty());
    }

    #[test]
    fn test_counts_by_show() {
        let ledger = Ledger::open_in_memory().unwrap();
        ledger.mark_processed("a", "1", None, None).unwrap();
        ledger.mark_processed("a", "2", None, None).unwrap();
        ledger.mark_processed("b", "1", None, None).unwrap();

        let counts = ledger.counts_by_show().unwrap();
        assert_eq!(counts, vec![("a".to_string(), 2), ("b".to_string(), 1)]);
        assert_eq!(ledger.processed_count(None).unwrap(), 3);
    }
}
