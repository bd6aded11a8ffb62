//! # Ensemble Memory
//!
//! Bounded, optionally persisted per-agent key/value store plus a rolling
//! prompt history. The store is the orchestrator's scratch space for
//! "what happened last" per agent; persistence (JSON file, or SQLite
//! behind the `sqlite` feature) is a whole-snapshot affair and never
//! authoritative over in-memory state.

pub mod backend;
pub mod context;
pub mod history;
pub mod merge;

pub use backend::{FileBackend, PersistedState, PersistenceBackend};
#[cfg(feature = "sqlite")]
pub use backend::SqliteBackend;
pub use context::{ContextMemory, ContextMemoryConfig, PersistenceMode};
pub use history::PromptRecord;
pub use merge::MergeStrategy;
