//! Dispatch layer: the agent registry, keyword router, and orchestrator.
//!
//! This crate turns the passive building blocks from `ensemble-core` and
//! `ensemble-memory` into a running system. An [`AgentRegistry`] owns the
//! set of executable agents and runs them with failure isolation; a
//! [`Router`] decomposes sanitized prompts into subtasks; the
//! [`Orchestrator`] ties both to a shared [`ContextMemory`] and exposes
//! the single `receive_prompt` entry point.
//!
//! ```no_run
//! use std::sync::Arc;
//! use ensemble_memory::ContextMemory;
//! use ensemble_runtime::{AgentRegistry, Orchestrator};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(AgentRegistry::new());
//! let memory = Arc::new(ContextMemory::in_memory());
//! let orchestrator = Orchestrator::new(registry, memory);
//!
//! let report = orchestrator.receive_prompt("generate ui").await?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

mod orchestrator;
mod registry;
mod router;
pub mod testkit;
mod throttle;

pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use registry::AgentRegistry;
pub use router::{RouteRule, Router, RouterError};
