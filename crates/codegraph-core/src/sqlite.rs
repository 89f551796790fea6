//! SQLite-backed graph sink.
//!
//! The bundled durable sink: one `nodes` table keyed by `(label, key)` and
//! one `relationships` table keyed by the full identity tuple. Attributes are
//! stored as JSON. A graph-database client (Memgraph, Neo4j) is an external
//! collaborator behind the same [`GraphSink`] trait and is not part of this
//! crate.

use std::path::Path;

use rusqlite::{params, Connection};

use crate::sink::GraphSink;
use crate::types::{NodeRecord, RelRecord, SinkError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS nodes (
    label TEXT NOT NULL,
    key   TEXT NOT NULL,
    attrs TEXT NOT NULL DEFAULT '{}',
    PRIMARY KEY (label, key)
);

CREATE TABLE IF NOT EXISTS relationships (
    source_label TEXT NOT NULL,
    source_key   TEXT NOT NULL,
    kind         TEXT NOT NULL,
    target_label TEXT NOT NULL,
    target_key   TEXT NOT NULL,
    attrs        TEXT NOT NULL DEFAULT '{}',
    PRIMARY KEY (source_label, source_key, kind, target_label, target_key)
);

CREATE INDEX IF NOT EXISTS idx_rel_kind ON relationships(kind);
";

/// SQLite implementation of [`GraphSink`]. Writes accumulate in an open
/// transaction that `flush` commits.
pub struct SqliteSink {
    conn: Connection,
    in_tx: bool,
}

impl SqliteSink {
    /// Open (or create) the sink database at the given path.
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn, in_tx: false })
    }

    /// In-memory sink, used by tests.
    pub fn in_memory() -> Result<Self, SinkError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn, in_tx: false })
    }

    /// Remove any previous snapshot. Used by `analyze --clean`.
    pub fn clean(path: &Path) -> Result<(), SinkError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SinkError::Io(e)),
        }
    }

    fn begin_if_needed(&mut self) -> Result<(), SinkError> {
        if !self.in_tx {
            self.conn.execute_batch("BEGIN IMMEDIATE")?;
            self.in_tx = true;
        }
        Ok(())
    }

    /// Number of stored nodes. Test/diagnostic helper.
    pub fn node_count(&self) -> Result<u64, SinkError> {
        let n: u64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM nodes", [], |row| row.get(0))?;
        Ok(n)
    }

    /// Number of stored relationships. Test/diagnostic helper.
    pub fn relationship_count(&self) -> Result<u64, SinkError> {
        let n: u64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM relationships", [], |row| row.get(0))?;
        Ok(n)
    }
}

impl GraphSink for SqliteSink {
    fn ensure_node(&mut self, node: &NodeRecord) -> Result<(), SinkError> {
        self.begin_if_needed()?;
        let attrs = serde_json::to_string(&node.attrs)
            .map_err(|e| SinkError::Database(e.to_string()))?;
        self.conn.execute(
            "INSERT INTO nodes (label, key, attrs) VALUES (?1, ?2, ?3)
             ON CONFLICT(label, key) DO UPDATE SET attrs = excluded.attrs",
            params![node.label.as_str(), node.key, attrs],
        )?;
        Ok(())
    }

    fn ensure_relationship(&mut self, rel: &RelRecord) -> Result<(), SinkError> {
        self.begin_if_needed()?;
        let attrs =
            serde_json::to_string(&rel.attrs).map_err(|e| SinkError::Database(e.to_string()))?;
        self.conn.execute(
            "INSERT INTO relationships
                 (source_label, source_key, kind, target_label, target_key, attrs)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(source_label, source_key, kind, target_label, target_key)
             DO UPDATE SET attrs = excluded.attrs",
            params![
                rel.source.label.as_str(),
                rel.source.key,
                rel.kind.as_str(),
                rel.target.label.as_str(),
                rel.target.key,
                attrs
            ],
        )?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        if self.in_tx {
            self.conn.execute_batch("COMMIT")?;
            self.in_tx = false;
        }
        Ok(())
    }
}
