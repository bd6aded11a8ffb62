//! The single entry point callers use: sanitize, throttle, route,
//! dispatch, aggregate, remember.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use ensemble_core::{
    Agent, AgentId, AgentResult, OrchestratorError, RegistryError, Subtask, sanitize_prompt,
};
use ensemble_memory::ContextMemory;

use crate::registry::AgentRegistry;
use crate::router::Router;
use crate::throttle::PromptThrottle;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Minimum interval between accepted prompts, process-wide. Zero
    /// disables the throttle.
    pub rate_limit_window: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            rate_limit_window: Duration::from_millis(1000),
        }
    }
}

/// How one routed subtask will be handled after the cycle/lookup checks.
enum Branch {
    Run(Subtask),
    Missing,
    Cycle,
}

/// Top-level dispatcher.
///
/// Per prompt: rate-limit check, sanitization, history recording, keyword
/// decomposition, concurrent dispatch with a visited-set cycle guard and
/// per-agent failure isolation, then aggregation in decomposition order.
/// The orchestrator holds shared handles to the registry and context
/// memory it was constructed with; it owns the decomposition policy and
/// the cross-cutting safety checks, nothing else.
pub struct Orchestrator {
    registry: Arc<AgentRegistry>,
    memory: Arc<ContextMemory>,
    router: Router,
    throttle: PromptThrottle,
}

impl Orchestrator {
    pub fn new(registry: Arc<AgentRegistry>, memory: Arc<ContextMemory>) -> Self {
        Self::with_config(registry, memory, OrchestratorConfig::default())
    }

    pub fn with_config(
        registry: Arc<AgentRegistry>,
        memory: Arc<ContextMemory>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            registry,
            memory,
            router: Router::default_routes(),
            throttle: PromptThrottle::new(config.rate_limit_window),
        }
    }

    /// Replace the routing table.
    pub fn with_router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    pub fn memory(&self) -> &Arc<ContextMemory> {
        &self.memory
    }

    /// Register an agent with the underlying registry.
    pub fn register_agent(&self, agent: Arc<dyn Agent>) -> Result<(), RegistryError> {
        self.registry.register(agent)
    }

    /// Handle one free-text prompt end to end and return the aggregated
    /// per-agent output, one `"<agent>: <output>"` line per routed
    /// subtask, in decomposition order.
    ///
    /// A prompt arriving inside the rate-limit window is rejected before
    /// any side effects: no history entry, no context writes, no agent
    /// runs.
    pub async fn receive_prompt(&self, prompt: &str) -> Result<String, OrchestratorError> {
        if let Err(retry_after) = self.throttle.check() {
            tracing::warn!(?retry_after, "prompt rejected by rate limit");
            return Err(OrchestratorError::RateLimited { retry_after });
        }

        let clean = sanitize_prompt(prompt);
        tracing::debug!(prompt = %clean, "accepted prompt");
        self.memory.record_prompt(&clean);

        let subtasks = self.router.route(&clean);
        let results = self.dispatch(subtasks).await;
        self.memory.flush();

        Ok(results
            .into_iter()
            .map(|(agent, result)| format!("{agent}: {}", result.output()))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Run routed subtasks concurrently, guarding against repeated
    /// invocation of the same agent within this call.
    async fn dispatch(&self, subtasks: Vec<Subtask>) -> Vec<(AgentId, AgentResult)> {
        let mut visited: HashSet<AgentId> = HashSet::new();
        let branches: Vec<(AgentId, Branch)> = subtasks
            .into_iter()
            .map(|subtask| {
                let target = subtask.agent.clone();
                // Lookup comes first: only agents that would actually run
                // enter the visited set, so a missing agent routed twice
                // reports two misses, not a miss and a cycle.
                let branch = if !self.registry.contains(&target) {
                    tracing::error!(agent = %target, "routed agent is not registered");
                    Branch::Missing
                } else if !visited.insert(target.clone()) {
                    tracing::warn!(agent = %target, "cycle detected, agent already invoked in this call");
                    Branch::Cycle
                } else {
                    Branch::Run(subtask)
                };
                (target, branch)
            })
            .collect();

        let futures = branches.into_iter().map(|(target, branch)| async move {
            let result = match branch {
                Branch::Cycle => AgentResult::ok(""),
                Branch::Missing => AgentResult::failure(
                    format!("Agent not found: {target}"),
                    format!("agent '{target}' is not registered"),
                ),
                Branch::Run(subtask) => {
                    let result = self
                        .registry
                        .execute_with_agent(&target, &subtask.input, subtask.context.as_ref())
                        .await;
                    self.record_outcome(&target, &subtask.input, &result);
                    result
                }
            };
            (target, result)
        });

        futures::future::join_all(futures).await
    }

    /// Remember the most recent task/result pair for an agent so later
    /// calls can inspect what it last did.
    fn record_outcome(&self, agent: &AgentId, task: &str, result: &AgentResult) {
        let entries = [
            ("last_task", Value::String(task.to_string())),
            (
                "last_result",
                serde_json::to_value(result).unwrap_or(Value::Null),
            ),
        ];
        for (key, value) in entries {
            if let Err(e) = self.memory.save(agent.as_str(), key, value) {
                tracing::warn!(agent = %agent, key, error = %e, "failed to record outcome");
            }
        }
    }
}
