//! Persistence backends for context memory.
//!
//! A backend persists the whole per-agent mapping and loads it back
//! wholesale; there is no incremental diffing. Backends are deliberately
//! dumb — bounding, merging, and eviction all happen in
//! [`ContextMemory`](crate::ContextMemory), which treats a backend as a
//! snapshot sink.

use std::collections::HashMap;

use serde_json::Value;

use ensemble_core::error::{MemoryError, PersistenceKind};

/// The on-disk shape: top-level keys are agent identities, each value a
/// flat mapping of context key to JSON value.
pub type PersistedState = HashMap<String, HashMap<String, Value>>;

pub trait PersistenceBackend: Send + Sync {
    fn kind(&self) -> PersistenceKind;

    /// Load the entire persisted state. A missing store is empty state,
    /// not an error.
    fn load(&self) -> Result<PersistedState, MemoryError>;

    /// Replace the entire persisted state with `state`.
    fn persist(&self, state: &PersistedState) -> Result<(), MemoryError>;
}

mod file;
pub use file::FileBackend;

#[cfg(feature = "sqlite")]
mod sqlite;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;
