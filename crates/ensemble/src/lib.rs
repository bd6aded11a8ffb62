//! # Ensemble
//!
//! Ensemble is a multi-agent dispatch runtime. A free-text prompt goes in
//! one end; the other end fans it out to specialized agents, runs them
//! concurrently with failure isolation, and hands back an aggregated
//! report while recording what each agent last did.
//!
//! ## Core Components
//!
//! - **[Agent]**: Capability contract every dispatchable worker implements
//! - **[AgentRegistry]**: Directory of agents with isolated execution
//! - **[ContextMemory]**: Bounded per-agent key/value store with prompt history
//! - **[Orchestrator]**: Sanitizes, rate-limits, routes, and dispatches prompts
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use ensemble::{Agent, AgentFault, AgentId, AgentResult, Capability};
//! use ensemble::{AgentRegistry, ContextMemory, Orchestrator};
//! use async_trait::async_trait;
//! use serde_json::Value;
//!
//! struct Greeter {
//!     id: AgentId,
//! }
//!
//! #[async_trait]
//! impl Agent for Greeter {
//!     fn id(&self) -> &AgentId {
//!         &self.id
//!     }
//!
//!     fn capabilities(&self) -> &[Capability] {
//!         &[]
//!     }
//!
//!     async fn run(&self, input: &str, _context: Option<&Value>) -> Result<AgentResult, AgentFault> {
//!         Ok(AgentResult::ok(format!("hello, {input}")))
//!     }
//! }
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(AgentRegistry::new());
//! let memory = Arc::new(ContextMemory::in_memory());
//! let orchestrator = Orchestrator::new(registry, memory);
//!
//! orchestrator.register_agent(Arc::new(Greeter {
//!     id: AgentId::new("frontend")?,
//! }))?;
//!
//! let report = orchestrator.receive_prompt("generate ui").await?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

// Module aliases for namespaced access
pub use ensemble_core as core;
pub use ensemble_memory as memory;
pub use ensemble_runtime as runtime;

// Agent contract and identifiers
pub use ensemble_core::{Agent, AgentFault, AgentId, Capability, InvalidAgentId};

// Task and result shapes
pub use ensemble_core::{AgentResult, MalformedAgentResult, Subtask};

// Error taxonomy
pub use ensemble_core::{MemoryError, OrchestratorError, PersistenceKind, RegistryError};

// Prompt sanitization
pub use ensemble_core::sanitize_prompt;

// Context memory and persistence
pub use ensemble_memory::{
    ContextMemory, ContextMemoryConfig, FileBackend, MergeStrategy, PersistedState,
    PersistenceBackend, PersistenceMode, PromptRecord,
};

#[cfg(feature = "sqlite")]
pub use ensemble_memory::SqliteBackend;

// Dispatch layer
pub use ensemble_runtime::{
    AgentRegistry, Orchestrator, OrchestratorConfig, RouteRule, Router, RouterError,
};
