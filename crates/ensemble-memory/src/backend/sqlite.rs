use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, params};
use serde_json::Value;

use ensemble_core::error::{MemoryError, PersistenceKind};

use super::{PersistedState, PersistenceBackend};

/// SQLite persistence: `(agent_id, key, value)` rows in a single table,
/// value JSON-encoded.
///
/// No uniqueness constraint is assumed across rows for the same
/// `(agent_id, key)` pair; a flush replaces the whole table
/// (delete-then-reinsert inside one transaction) so duplicates never
/// accumulate.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS context (
    agent_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL
)";

fn sqlite_error(details: impl std::fmt::Display) -> MemoryError {
    MemoryError::persistence(PersistenceKind::Sqlite, details.to_string())
}

impl SqliteBackend {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| sqlite_error(format!("failed to open database: {e}")))?;
        conn.execute(SCHEMA, [])
            .map_err(|e| sqlite_error(format!("failed to create context table: {e}")))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self, MemoryError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| sqlite_error(format!("failed to open database: {e}")))?;
        conn.execute(SCHEMA, [])
            .map_err(|e| sqlite_error(format!("failed to create context table: {e}")))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl PersistenceBackend for SqliteBackend {
    fn kind(&self) -> PersistenceKind {
        PersistenceKind::Sqlite
    }

    fn load(&self) -> Result<PersistedState, MemoryError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| sqlite_error(format!("connection lock poisoned: {e}")))?;

        let mut stmt = conn
            .prepare("SELECT agent_id, key, value FROM context")
            .map_err(sqlite_error)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(sqlite_error)?;

        let mut state = PersistedState::default();
        for row in rows {
            let (agent_id, key, raw) = row.map_err(sqlite_error)?;
            let value: Value = serde_json::from_str(&raw).map_err(|e| {
                sqlite_error(format!("invalid JSON for {agent_id}.{key}: {e}"))
            })?;
            state.entry(agent_id).or_default().insert(key, value);
        }
        tracing::debug!(agents = state.len(), "loaded context rows from sqlite");
        Ok(state)
    }

    fn persist(&self, state: &PersistedState) -> Result<(), MemoryError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| sqlite_error(format!("connection lock poisoned: {e}")))?;

        let tx = conn.transaction().map_err(sqlite_error)?;
        tx.execute("DELETE FROM context", []).map_err(sqlite_error)?;
        {
            let mut stmt = tx
                .prepare("INSERT INTO context (agent_id, key, value) VALUES (?1, ?2, ?3)")
                .map_err(sqlite_error)?;
            for (agent_id, entries) in state {
                for (key, value) in entries {
                    let raw = serde_json::to_string(value).map_err(|e| {
                        sqlite_error(format!("failed to encode {agent_id}.{key}: {e}"))
                    })?;
                    stmt.execute(params![agent_id, key, raw])
                        .map_err(sqlite_error)?;
                }
            }
        }
        tx.commit().map_err(sqlite_error)?;

        tracing::debug!(agents = state.len(), "persisted context rows to sqlite");
        Ok(())
    }
}
