//! SQLite persistence stage
//!
//! Each executed record is stored as a JSON document in a `records` table.
//! The database is opened in `initialize`, never at construction.

use crate::pipeline::{option_or, Namespace, Payload, Stage, StageConfig, StageError};
use chrono::Utc;
use rusqlite::{params, Connection};
use serde_json::{json, Value};
use std::path::PathBuf;

/// SQL schema for the record store
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT,
    schema_version TEXT NOT NULL,
    payload TEXT NOT NULL,
    stored_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_records_url ON records(url);
"#;

/// Persists records and reports the row under `storage`
///
/// Options: `path` (database file; in memory when absent),
/// `schema_version` (default `"1.0"`).
pub struct RecordStore {
    config: StageConfig,
    path: Option<PathBuf>,
    schema_version: String,
    conn: Option<Connection>,
}

impl RecordStore {
    pub fn new(config: StageConfig) -> Result<Self, StageError> {
        let path: Option<String> = option_or(&config, "path", None)?;
        Ok(Self {
            path: path.map(PathBuf::from),
            schema_version: option_or(&config, "schema_version", "1.0".to_string())?,
            config,
            conn: None,
        })
    }

    pub fn factory(config: StageConfig, _: &Namespace) -> Result<Box<dyn Stage>, StageError> {
        Ok(Box::new(Self::new(config)?))
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    fn open(&self) -> Result<Connection, rusqlite::Error> {
        let conn = match &self.path {
            Some(path) => {
                let conn = Connection::open(path)?;
                conn.execute_batch("PRAGMA journal_mode = WAL;")?;
                conn
            }
            None => Connection::open_in_memory()?,
        };
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(conn)
    }

    fn connection(&self) -> Result<&Connection, StageError> {
        self.conn.as_ref().ok_or(StageError::NotInitialized)
    }

    /// Number of stored records
    pub fn count(&self) -> Result<i64, StageError> {
        let conn = self.connection()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?)
    }

    /// Stored documents for `url`, oldest first
    pub fn retrieve(&self, url: &str) -> Result<Vec<Value>, StageError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare("SELECT payload FROM records WHERE url = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![url], |row| row.get::<_, String>(0))?;

        let mut out = Vec::new();
        for row in rows {
            out.push(serde_json::from_str(&row?)?);
        }
        Ok(out)
    }
}

impl Stage for RecordStore {
    fn name(&self) -> &str {
        "RecordStore"
    }

    fn config(&self) -> &StageConfig {
        &self.config
    }

    fn initialize(&mut self) -> bool {
        match self.open() {
            Ok(conn) => {
                self.conn = Some(conn);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to open record store: {}", e);
                false
            }
        }
    }

    fn execute(&mut self, payload: Payload) -> Result<Payload, StageError> {
        let mut record = payload.into_record_wrapped();
        let document = serde_json::to_string(&record)?;
        let url = record.get("url").and_then(Value::as_str).map(str::to_string);

        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO records (url, schema_version, payload, stored_at) VALUES (?1, ?2, ?3, ?4)",
            params![url, self.schema_version, document, Utc::now().to_rfc3339()],
        )?;
        let storage_id = conn.last_insert_rowid();

        record.insert(
            "storage".into(),
            json!({
                "status": "stored",
                "storage_id": storage_id,
                "schema_version": self.schema_version,
                "data_size": document.len(),
            }),
        );
        Ok(Payload::Record(record))
    }

    fn cleanup(&mut self) {
        self.conn = None;
    }
}
