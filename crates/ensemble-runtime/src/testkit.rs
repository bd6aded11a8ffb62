//! Test doubles for exercising the dispatch pipeline.
//!
//! Deliberately tiny agents with predictable behavior: echo, fail, delay,
//! and record. Used by this crate's own unit and integration suites, and
//! handy for downstream crates wiring up an orchestrator in tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use ensemble_core::{Agent, AgentFault, AgentId, AgentResult, Capability};

/// Log of `(result, context)` pairs seen by an agent's post-hook.
pub type SharedHookLog = Arc<Mutex<Vec<(AgentResult, Value)>>>;

/// Factory for shared hook logs.
pub struct HookRecorder;

impl HookRecorder {
    pub fn shared() -> SharedHookLog {
        Arc::new(Mutex::new(Vec::new()))
    }
}

/// Succeeds with `"<id>: <input>"`.
pub struct EchoAgent {
    id: AgentId,
    name: String,
    capabilities: Vec<Capability>,
    hook: Option<SharedHookLog>,
}

impl EchoAgent {
    pub fn new(id: &str) -> Self {
        Self::named(id, id)
    }

    pub fn named(id: &str, name: &str) -> Self {
        Self {
            id: AgentId::new(id).expect("test agent id is valid"),
            name: name.to_string(),
            capabilities: Vec::new(),
            hook: None,
        }
    }

    pub fn with_capabilities(id: &str, capabilities: &[&str]) -> Self {
        let mut agent = Self::new(id);
        agent.capabilities = capabilities.iter().map(|c| Capability::from(*c)).collect();
        agent
    }

    pub fn with_hook(id: &str, hook: SharedHookLog) -> Self {
        let mut agent = Self::new(id);
        agent.hook = Some(hook);
        agent
    }
}

#[async_trait]
impl Agent for EchoAgent {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    async fn run(&self, input: &str, _context: Option<&Value>) -> Result<AgentResult, AgentFault> {
        Ok(AgentResult::ok(format!("{}: {}", self.id, input)))
    }

    async fn on_subtask_result(&self, result: &AgentResult, context: &Value) {
        if let Some(hook) = &self.hook {
            hook.lock()
                .expect("hook log lock")
                .push((result.clone(), context.clone()));
        }
    }
}

/// Always raises a fault with the configured message.
pub struct FailingAgent {
    id: AgentId,
    message: String,
}

impl FailingAgent {
    pub fn new(id: &str, message: &str) -> Self {
        Self {
            id: AgentId::new(id).expect("test agent id is valid"),
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl Agent for FailingAgent {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn capabilities(&self) -> &[Capability] {
        &[]
    }

    async fn run(&self, _input: &str, _context: Option<&Value>) -> Result<AgentResult, AgentFault> {
        Err(self.message.clone().into())
    }
}

/// Echoes like [`EchoAgent`] after sleeping for the configured delay.
pub struct SlowEchoAgent {
    id: AgentId,
    delay: Duration,
}

impl SlowEchoAgent {
    pub fn new(id: &str, delay: Duration) -> Self {
        Self {
            id: AgentId::new(id).expect("test agent id is valid"),
            delay,
        }
    }
}

#[async_trait]
impl Agent for SlowEchoAgent {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn capabilities(&self) -> &[Capability] {
        &[]
    }

    async fn run(&self, input: &str, _context: Option<&Value>) -> Result<AgentResult, AgentFault> {
        tokio::time::sleep(self.delay).await;
        Ok(AgentResult::ok(format!("{}: {}", self.id, input)))
    }
}
