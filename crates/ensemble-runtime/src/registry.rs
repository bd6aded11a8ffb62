//! The directory of executable agents and the engine that runs them safely.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use ensemble_core::{Agent, AgentId, AgentResult, Capability, RegistryError, Subtask};

#[derive(Default)]
struct RegistryInner {
    agents: HashMap<AgentId, Arc<dyn Agent>>,
    /// Registration order, for stable capability-lookup results.
    order: Vec<AgentId>,
}

/// Owns the set of registered agents and executes them with per-call
/// failure isolation: no fault raised by an agent's own logic ever
/// propagates past this boundary — it is caught and converted into a
/// failure-shaped [`AgentResult`].
///
/// The registry is an explicitly constructed service object; build one at
/// startup and share it via `Arc` (dependency injection, no globals).
/// Internal state sits behind an `RwLock`; guards are never held across an
/// await (agents are cloned out before execution).
pub struct AgentRegistry {
    inner: RwLock<RegistryInner>,
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, RegistryInner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, RegistryInner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a new agent. Identities are unique for the lifetime of the
    /// registry; a collision rejects the new agent and leaves the original
    /// registration untouched.
    pub fn register(&self, agent: Arc<dyn Agent>) -> Result<(), RegistryError> {
        let id = agent.id().clone();
        let mut inner = self.write();
        if inner.agents.contains_key(&id) {
            return Err(RegistryError::DuplicateAgent(id));
        }
        tracing::info!(agent = %id, name = agent.name(), "registered agent");
        inner.agents.insert(id.clone(), agent);
        inner.order.push(id);
        Ok(())
    }

    pub fn get(&self, id: &AgentId) -> Option<Arc<dyn Agent>> {
        self.read().agents.get(id).cloned()
    }

    pub fn contains(&self, id: &AgentId) -> bool {
        self.read().agents.contains_key(id)
    }

    /// All registered agents in registration order.
    pub fn agents(&self) -> Vec<Arc<dyn Agent>> {
        let inner = self.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.agents.get(id).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().agents.is_empty()
    }

    /// Drop all registrations. Test lifecycle helper.
    pub fn clear(&self) {
        let mut inner = self.write();
        inner.agents.clear();
        inner.order.clear();
        tracing::debug!("cleared agent registry");
    }

    /// Agents whose declared capability set is a superset of `required`,
    /// in registration order. An empty requirement matches every agent.
    pub fn find_by_capabilities(&self, required: &[Capability]) -> Vec<Arc<dyn Agent>> {
        let inner = self.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.agents.get(id))
            .filter(|agent| {
                required
                    .iter()
                    .all(|capability| agent.capabilities().contains(capability))
            })
            .cloned()
            .collect()
    }

    /// Execute one unit of work with the named agent.
    ///
    /// A lookup miss yields a well-formed failure result rather than an
    /// error, and any fault the agent raises is caught here and converted
    /// to a failure result carrying the fault's message.
    pub async fn execute_with_agent(
        &self,
        id: &AgentId,
        input: &str,
        context: Option<&Value>,
    ) -> AgentResult {
        let Some(agent) = self.get(id) else {
            tracing::warn!(agent = %id, "execution requested for unknown agent");
            return AgentResult::failure(
                format!("Agent not found: {id}"),
                format!("agent '{id}' is not registered"),
            );
        };

        tracing::debug!(agent = %id, input_len = input.len(), "executing agent");
        match agent.run(input, context).await {
            Ok(result) => {
                tracing::debug!(
                    agent = %id,
                    success = result.is_success(),
                    "agent execution finished"
                );
                result
            }
            Err(fault) => {
                tracing::error!(agent = %id, error = %fault, "agent raised during execution");
                AgentResult::failure(format!("error from {id}"), fault.to_string())
            }
        }
    }

    /// Execute a batch of subtasks concurrently.
    ///
    /// The batch is stably sorted by descending priority (equal priorities
    /// keep their relative input order) and the returned results preserve
    /// that sorted order regardless of completion order. After each agent
    /// call completes, the agent's [`on_subtask_result`](Agent::on_subtask_result)
    /// hook is invoked with the result and the subtask's context before
    /// the result is folded into the output.
    pub async fn execute_subtasks(&self, subtasks: Vec<Subtask>) -> Vec<AgentResult> {
        if subtasks.is_empty() {
            return Vec::new();
        }

        let mut ordered = subtasks;
        ordered.sort_by_key(|subtask| Reverse(subtask.priority));
        tracing::debug!(count = ordered.len(), "executing subtask batch");

        let branches = ordered.into_iter().map(|subtask| {
            let agent = self.get(&subtask.agent);
            async move {
                let result = self
                    .execute_with_agent(&subtask.agent, &subtask.input, subtask.context.as_ref())
                    .await;
                if let Some(agent) = agent {
                    let context = subtask
                        .context
                        .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
                    agent.on_subtask_result(&result, &context).await;
                }
                result
            }
        });

        futures::future::join_all(branches).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{EchoAgent, FailingAgent, HookRecorder, SlowEchoAgent};
    use serde_json::json;
    use std::time::Duration;

    fn id(s: &str) -> AgentId {
        AgentId::new(s).unwrap()
    }

    #[test]
    fn duplicate_registration_is_rejected_and_original_kept() {
        let registry = AgentRegistry::new();
        registry
            .register(Arc::new(EchoAgent::named("frontend", "original")))
            .unwrap();

        let err = registry
            .register(Arc::new(EchoAgent::named("frontend", "impostor")))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateAgent(id("frontend")));

        let kept = registry.get(&id("frontend")).unwrap();
        assert_eq!(kept.name(), "original");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn capability_lookup_requires_a_superset_and_keeps_insertion_order() {
        let registry = AgentRegistry::new();
        registry
            .register(Arc::new(EchoAgent::with_capabilities(
                "frontend",
                &["ui", "react"],
            )))
            .unwrap();
        registry
            .register(Arc::new(EchoAgent::with_capabilities(
                "fullstack",
                &["ui", "react", "api"],
            )))
            .unwrap();
        registry
            .register(Arc::new(EchoAgent::with_capabilities("backend", &["api"])))
            .unwrap();

        let found = registry.find_by_capabilities(&["ui".into(), "react".into()]);
        let ids: Vec<_> = found.iter().map(|a| a.id().as_str().to_string()).collect();
        assert_eq!(ids, ["frontend", "fullstack"]);

        assert!(
            registry
                .find_by_capabilities(&["nonexistent".into()])
                .is_empty()
        );
        assert_eq!(registry.find_by_capabilities(&[]).len(), 3);
    }

    #[tokio::test]
    async fn executing_an_unknown_agent_yields_a_failure_result() {
        let registry = AgentRegistry::new();
        let result = registry.execute_with_agent(&id("ghost"), "hello", None).await;

        assert!(!result.is_success());
        assert_eq!(result.output(), "Agent not found: ghost");
        assert!(result.error().is_some());
    }

    #[tokio::test]
    async fn agent_faults_are_contained_at_the_registry_boundary() {
        let registry = AgentRegistry::new();
        registry
            .register(Arc::new(FailingAgent::new("flaky", "disk on fire")))
            .unwrap();

        let result = registry.execute_with_agent(&id("flaky"), "run", None).await;
        assert!(!result.is_success());
        assert_eq!(result.output(), "error from flaky");
        assert_eq!(result.error(), Some("disk on fire"));
    }

    #[tokio::test]
    async fn empty_batch_yields_empty_results() {
        let registry = AgentRegistry::new();
        assert!(registry.execute_subtasks(Vec::new()).await.is_empty());
    }

    #[tokio::test]
    async fn batch_results_follow_priority_order_not_completion_order() {
        let registry = AgentRegistry::new();
        registry.register(Arc::new(EchoAgent::new("fast"))).unwrap();
        registry
            .register(Arc::new(SlowEchoAgent::new(
                "slow",
                Duration::from_millis(50),
            )))
            .unwrap();

        // The higher-priority subtask targets the slower agent, so it
        // completes last but must still come back first.
        let results = registry
            .execute_subtasks(vec![
                Subtask::new(id("fast"), "a").with_priority(1),
                Subtask::new(id("slow"), "b").with_priority(5),
            ])
            .await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].output(), "slow: b");
        assert_eq!(results[1].output(), "fast: a");
    }

    #[tokio::test]
    async fn equal_priorities_keep_relative_input_order() {
        let registry = AgentRegistry::new();
        registry.register(Arc::new(EchoAgent::new("a"))).unwrap();
        registry.register(Arc::new(EchoAgent::new("b"))).unwrap();

        let results = registry
            .execute_subtasks(vec![
                Subtask::new(id("a"), "first"),
                Subtask::new(id("b"), "second"),
            ])
            .await;

        assert_eq!(results[0].output(), "a: first");
        assert_eq!(results[1].output(), "b: second");
    }

    #[tokio::test]
    async fn post_hook_receives_result_and_subtask_context() {
        let registry = AgentRegistry::new();
        let recorder = HookRecorder::shared();
        registry
            .register(Arc::new(EchoAgent::with_hook("frontend", recorder.clone())))
            .unwrap();

        registry
            .execute_subtasks(vec![
                Subtask::new(id("frontend"), "build").with_context(json!({ "page": "login" })),
            ])
            .await;

        let seen = recorder.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0.output(), "frontend: build");
        assert_eq!(seen[0].1, json!({ "page": "login" }));
    }

    #[tokio::test]
    async fn one_failing_subtask_does_not_disturb_its_siblings() {
        let registry = AgentRegistry::new();
        registry.register(Arc::new(EchoAgent::new("steady"))).unwrap();
        registry
            .register(Arc::new(FailingAgent::new("flaky", "boom")))
            .unwrap();

        let results = registry
            .execute_subtasks(vec![
                Subtask::new(id("steady"), "work"),
                Subtask::new(id("flaky"), "work"),
            ])
            .await;

        assert!(results[0].is_success());
        assert!(!results[1].is_success());
    }
}
