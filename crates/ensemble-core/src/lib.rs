//! # Ensemble Core
//!
//! Core contracts and types for the Ensemble dispatch runtime: validated
//! identifiers, the agent capability contract, subtask/result shapes, the
//! error taxonomy, and prompt sanitization.

pub mod agent;
pub mod error;
pub mod identifiers;
pub mod sanitize;
pub mod task;

pub use agent::{Agent, AgentFault};
pub use error::{MemoryError, OrchestratorError, PersistenceKind, RegistryError};
pub use identifiers::{AgentId, Capability, InvalidAgentId};
pub use sanitize::sanitize_prompt;
pub use task::{AgentResult, MalformedAgentResult, Subtask};
