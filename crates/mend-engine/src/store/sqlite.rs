//! SQLite-backed pattern store.
//!
//! One row per pattern: the bug digest and fix complexity as indexed
//! columns, the full pattern as a JSON document. The miner writes through
//! `insert`; the engine only ever queries.

use std::path::Path;

use rusqlite::{params, Connection};

use mend_core::errors::StoreError;
use mend_core::types::BugfixPattern;
use mend_core::PatternStore;

pub struct SqlitePatternStore {
    conn: Connection,
}

impl SqlitePatternStore {
    /// Open (and create, if needed) a store at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(backend)?;
        Self::with_connection(conn)
    }

    /// An in-memory database, for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(backend)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS bugfix_patterns (
                id INTEGER PRIMARY KEY,
                bug_digest TEXT NOT NULL,
                complexity INTEGER NOT NULL,
                document TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_patterns_bug_digest
                ON bugfix_patterns (bug_digest, complexity);",
        )
        .map_err(backend)?;
        Ok(Self { conn })
    }

    pub fn insert(&self, pattern: &BugfixPattern) -> Result<(), StoreError> {
        let document = serde_json::to_string(pattern)?;
        self.conn
            .execute(
                "INSERT INTO bugfix_patterns (bug_digest, complexity, document)
                 VALUES (?1, ?2, ?3)",
                params![
                    pattern.bug.hexdigest,
                    pattern.complexity() as i64,
                    document
                ],
            )
            .map_err(backend)?;
        Ok(())
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        self.conn
            .query_row("SELECT COUNT(*) FROM bugfix_patterns", [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|n| n as usize)
            .map_err(backend)
    }
}

impl PatternStore for SqlitePatternStore {
    fn find_matching(
        &self,
        bug_hexdigest: &str,
        max_complexity: usize,
    ) -> Result<Vec<BugfixPattern>, StoreError> {
        let mut statement = self
            .conn
            .prepare(
                "SELECT document FROM bugfix_patterns
                 WHERE bug_digest = ?1 AND complexity <= ?2
                 ORDER BY complexity ASC, id ASC",
            )
            .map_err(backend)?;
        let documents = statement
            .query_map(params![bug_hexdigest, max_complexity as i64], |row| {
                row.get::<_, String>(0)
            })
            .map_err(backend)?
            .collect::<Result<Vec<String>, _>>()
            .map_err(backend)?;
        documents
            .iter()
            .map(|doc| serde_json::from_str(doc).map_err(StoreError::from))
            .collect()
    }
}

fn backend(error: rusqlite::Error) -> StoreError {
    StoreError::Backend {
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abstraction::pattern_from_sources;

    #[test]
    fn round_trips_patterns_ordered_by_complexity() {
        let store = SqlitePatternStore::open_in_memory().unwrap();
        // Two fixes for the same bug shape, different complexity.
        let simple =
            pattern_from_sources(1, "if a >= 1:\n    pass\n", 1, "if a > 1:\n    pass\n").unwrap();
        let busier = pattern_from_sources(
            1,
            "if a >= 1:\n    pass\n",
            1,
            "if a > b:\n    pass\n",
        )
        .unwrap();
        assert_eq!(simple.bug.hexdigest, busier.bug.hexdigest);
        store.insert(&busier).unwrap();
        store.insert(&simple).unwrap();
        assert_eq!(store.count().unwrap(), 2);

        let hits = store.find_matching(&simple.bug.hexdigest, 10).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].complexity() <= hits[1].complexity());
    }
}
