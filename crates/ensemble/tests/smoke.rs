//! Whole-stack smoke test through the facade re-exports.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use ensemble::{
    Agent, AgentFault, AgentId, AgentResult, AgentRegistry, Capability, ContextMemory,
    ContextMemoryConfig, Orchestrator, OrchestratorConfig, PersistenceMode,
};

struct Specialist {
    id: AgentId,
    capabilities: Vec<Capability>,
}

impl Specialist {
    fn new(id: &str, capabilities: &[&str]) -> Self {
        Self {
            id: AgentId::new(id).expect("valid id"),
            capabilities: capabilities.iter().map(|c| Capability::from(*c)).collect(),
        }
    }
}

#[async_trait]
impl Agent for Specialist {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    async fn run(&self, input: &str, _context: Option<&Value>) -> Result<AgentResult, AgentFault> {
        Ok(AgentResult::ok(format!("{} handled '{input}'", self.id)))
    }
}

#[tokio::test]
async fn a_prompt_flows_through_the_whole_stack_and_persists() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("context.json");

    let registry = Arc::new(AgentRegistry::new());
    let memory = Arc::new(
        ContextMemory::new(ContextMemoryConfig {
            persistence: PersistenceMode::File(path.clone()),
            ..ContextMemoryConfig::default()
        })
        .expect("memory"),
    );

    let orchestrator = Orchestrator::with_config(
        registry.clone(),
        memory,
        OrchestratorConfig {
            rate_limit_window: Duration::ZERO,
        },
    );
    orchestrator
        .register_agent(Arc::new(Specialist::new("frontend", &["ui"])))
        .unwrap();
    orchestrator
        .register_agent(Arc::new(Specialist::new("database", &["sql"])))
        .unwrap();

    let report = orchestrator
        .receive_prompt("build a login page and a database schema")
        .await
        .unwrap();
    let lines: Vec<_> = report.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("frontend:"));
    assert!(lines[1].starts_with("database:"));

    // Capability lookup still sees both agents through the shared registry.
    assert_eq!(registry.find_by_capabilities(&["ui".into()]).len(), 1);

    // The dispatch outcome was flushed to disk; a fresh store sees it.
    let reloaded = ContextMemory::new(ContextMemoryConfig {
        persistence: PersistenceMode::File(path),
        ..ContextMemoryConfig::default()
    })
    .expect("reloaded memory");
    reloaded.load();
    assert_eq!(
        reloaded.get("frontend", "last_task"),
        Some(json!("build a login page and a database schema"))
    );
}
