//! Error taxonomy for the dispatch core.
//!
//! The propagation policy is deliberate: faults never cross the registry
//! or orchestrator boundary as raised errors. Registration and memory
//! operations return structured `Result`s; agent execution faults are
//! converted into failure-shaped results at the registry boundary; and
//! persistence faults are logged and swallowed so in-memory state stays
//! authoritative.

use std::time::Duration;

use crate::identifiers::{AgentId, InvalidAgentId};

/// Errors raised by agent registration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// An agent with this identity is already registered. The original
    /// registration is retained unchanged.
    #[error("agent '{0}' is already registered")]
    DuplicateAgent(AgentId),
}

/// Which persistence backend a memory fault came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceKind {
    File,
    Sqlite,
}

impl std::fmt::Display for PersistenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceKind::File => write!(f, "file"),
            PersistenceKind::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Errors raised by context-memory operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    /// The agent identifier failed validation (empty, too long, or
    /// carrying disallowed characters).
    #[error("invalid agent identifier: {0}")]
    InvalidIdentifier(#[from] InvalidAgentId),

    /// Context keys must be non-empty.
    #[error("context key cannot be empty")]
    EmptyKey,

    /// A merge was requested against a non-mergeable patch value.
    #[error("merge patch for '{key}' must be a JSON object, got {found}")]
    NotMergeable { key: String, found: &'static str },

    /// Load/save I/O or serialization failure. Callers of the public
    /// persistence entry points never see this variant; it is logged and
    /// swallowed there.
    #[error("{backend} persistence failed: {details}")]
    Persistence {
        backend: PersistenceKind,
        details: String,
    },
}

impl MemoryError {
    pub fn persistence(backend: PersistenceKind, details: impl Into<String>) -> Self {
        MemoryError::Persistence {
            backend,
            details: details.into(),
        }
    }
}

/// Errors surfaced by the orchestrator's public entry point.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrchestratorError {
    /// The prompt arrived inside the global rate-limit window and was
    /// rejected before any side effects.
    #[error("rate limited, retry in {retry_after:?}")]
    RateLimited { retry_after: Duration },
}
