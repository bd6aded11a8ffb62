use std::fs;
use std::path::PathBuf;

use ensemble_core::error::{MemoryError, PersistenceKind};

use super::{PersistedState, PersistenceBackend};

/// JSON-document persistence: one file holding the whole per-agent map.
///
/// Writes go through a temporary file followed by an atomic rename so a
/// crash mid-flush never leaves a truncated document behind.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl PersistenceBackend for FileBackend {
    fn kind(&self) -> PersistenceKind {
        PersistenceKind::File
    }

    fn load(&self) -> Result<PersistedState, MemoryError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = ?self.path, "context file not found, starting fresh");
                return Ok(PersistedState::default());
            }
            Err(e) => {
                return Err(MemoryError::persistence(
                    PersistenceKind::File,
                    format!("failed to read {}: {}", self.path.display(), e),
                ));
            }
        };

        let state: PersistedState = serde_json::from_str(&contents).map_err(|e| {
            MemoryError::persistence(
                PersistenceKind::File,
                format!("failed to parse {}: {}", self.path.display(), e),
            )
        })?;
        tracing::debug!(path = ?self.path, agents = state.len(), "loaded context file");
        Ok(state)
    }

    fn persist(&self, state: &PersistedState) -> Result<(), MemoryError> {
        let json = serde_json::to_string_pretty(state).map_err(|e| {
            MemoryError::persistence(
                PersistenceKind::File,
                format!("failed to serialize context state: {e}"),
            )
        })?;

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, json).map_err(|e| {
            MemoryError::persistence(
                PersistenceKind::File,
                format!("failed to write {}: {}", tmp_path.display(), e),
            )
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            MemoryError::persistence(
                PersistenceKind::File,
                format!(
                    "failed to rename {} to {}: {}",
                    tmp_path.display(),
                    self.path.display(),
                    e
                ),
            )
        })?;

        tracing::debug!(path = ?self.path, agents = state.len(), "persisted context file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_file_loads_as_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("absent.json"));
        assert!(backend.load().unwrap().is_empty());
    }

    #[test]
    fn persist_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("context.json"));

        let mut state = PersistedState::default();
        state.entry("frontend".to_string()).or_default().insert(
            "last_task".to_string(),
            json!("build a page"),
        );
        backend.persist(&state).unwrap();

        let loaded = backend.load().unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn corrupt_file_surfaces_a_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("context.json");
        fs::write(&path, "not json at all").unwrap();

        let backend = FileBackend::new(&path);
        assert!(matches!(
            backend.load(),
            Err(MemoryError::Persistence { .. })
        ));
    }
}
