//! The capability contract every agent must satisfy.

use async_trait::async_trait;
use serde_json::Value;

use crate::identifiers::{AgentId, Capability};
use crate::task::AgentResult;

/// Whatever an agent's own logic raises. The registry catches these at its
/// boundary and converts them into failure-shaped [`AgentResult`]s, so
/// faults never propagate past the dispatch layer.
pub type AgentFault = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An opaque executable unit the registry can look up and run.
///
/// Implementations declare a stable identity and a set of capability tags,
/// and provide an asynchronous `run` method. `run` may suspend internally
/// (network calls, subprocesses, timers); it must not assume synchronous
/// completion. Returning `Err` is allowed — the registry converts the
/// fault into a failure result rather than letting it escape.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Stable identity, unique across a registry.
    fn id(&self) -> &AgentId;

    /// Human-readable name. Defaults to the identity.
    fn name(&self) -> &str {
        self.id().as_str()
    }

    /// Capability tags this agent advertises.
    fn capabilities(&self) -> &[Capability];

    /// Execute one unit of work.
    async fn run(&self, input: &str, context: Option<&Value>)
    -> Result<AgentResult, AgentFault>;

    /// Post-execution hook invoked by the registry after a batched subtask
    /// completes, with the result and the subtask's context. Default is a
    /// no-op; agents override it to react to their own outcomes.
    async fn on_subtask_result(&self, _result: &AgentResult, _context: &Value) {}
}
