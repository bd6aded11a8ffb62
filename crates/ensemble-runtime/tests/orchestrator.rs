//! End-to-end dispatch tests through the public orchestrator surface.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use ensemble_core::{AgentId, OrchestratorError};
use ensemble_memory::ContextMemory;
use ensemble_runtime::testkit::{EchoAgent, FailingAgent};
use ensemble_runtime::{AgentRegistry, Orchestrator, OrchestratorConfig, Router};

fn orchestrator() -> Orchestrator {
    Orchestrator::with_config(
        Arc::new(AgentRegistry::new()),
        Arc::new(ContextMemory::in_memory()),
        OrchestratorConfig {
            rate_limit_window: Duration::ZERO,
        },
    )
}

fn register_specialists(orchestrator: &Orchestrator) {
    for id in ["frontend", "backend", "database", "devops", "docs"] {
        orchestrator
            .register_agent(Arc::new(EchoAgent::new(id)))
            .unwrap();
    }
}

#[tokio::test]
async fn a_prompt_touching_several_specialties_fans_out_in_table_order() {
    let orchestrator = orchestrator();
    register_specialists(&orchestrator);

    let prompt = "build a login page, add an api endpoint, and write the readme";
    let output = orchestrator.receive_prompt(prompt).await.unwrap();

    let lines: Vec<_> = output.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("frontend:"));
    assert!(lines[1].starts_with("backend:"));
    assert!(lines[2].starts_with("docs:"));
}

#[tokio::test]
async fn unclassifiable_prompts_go_to_the_fallback_agent() {
    let orchestrator = orchestrator();
    register_specialists(&orchestrator);

    let output = orchestrator
        .receive_prompt("do something unclassifiable")
        .await
        .unwrap();
    assert_eq!(output, "frontend: frontend: do something unclassifiable");
}

#[tokio::test]
async fn injected_markup_never_reaches_the_agents() {
    let orchestrator = orchestrator();
    register_specialists(&orchestrator);

    let output = orchestrator
        .receive_prompt("<script>alert(1)</script> generate ui")
        .await
        .unwrap();
    assert_eq!(output, "frontend: frontend: generate ui");
}

#[tokio::test]
async fn two_routes_to_the_same_agent_execute_it_only_once() {
    let registry = Arc::new(AgentRegistry::new());
    let memory = Arc::new(ContextMemory::in_memory());
    // Both the "ui" and "component" rules point at the same agent, so a
    // prompt hitting both would dispatch it twice without the guard.
    let router = Router::new(AgentId::new("frontend").unwrap())
        .with_rule(r"\bui\b", AgentId::new("frontend").unwrap())
        .unwrap()
        .with_rule(r"\bcomponent\b", AgentId::new("frontend").unwrap())
        .unwrap();

    let orchestrator = Orchestrator::with_config(
        registry,
        memory,
        OrchestratorConfig {
            rate_limit_window: Duration::ZERO,
        },
    )
    .with_router(router);
    orchestrator
        .register_agent(Arc::new(EchoAgent::new("frontend")))
        .unwrap();

    let output = orchestrator
        .receive_prompt("build a ui component")
        .await
        .unwrap();

    let lines: Vec<_> = output.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "frontend: frontend: build a ui component");
    // The guarded duplicate contributes an empty line, not a second run.
    assert_eq!(lines[1], "frontend: ");
}

#[tokio::test]
async fn one_broken_specialist_leaves_the_rest_of_the_report_intact() {
    let orchestrator = orchestrator();
    orchestrator
        .register_agent(Arc::new(FailingAgent::new("backend", "connection refused")))
        .unwrap();
    orchestrator
        .register_agent(Arc::new(EchoAgent::new("database")))
        .unwrap();

    let output = orchestrator
        .receive_prompt("add an api and a database migration")
        .await
        .unwrap();

    let lines: Vec<_> = output.lines().collect();
    assert_eq!(lines[0], "backend: error from backend");
    assert_eq!(lines[1], "database: database: add an api and a database migration");
}

#[tokio::test]
async fn dispatch_leaves_a_last_task_and_last_result_per_agent() {
    let orchestrator = orchestrator();
    register_specialists(&orchestrator);

    orchestrator
        .receive_prompt("update the database schema")
        .await
        .unwrap();

    let memory = orchestrator.memory();
    assert_eq!(
        memory.get("database", "last_task"),
        Some(json!("update the database schema"))
    );
    let last_result = memory.get("database", "last_result").unwrap();
    assert_eq!(last_result["success"], json!(true));
    // Agents the router did not select stay untouched.
    assert_eq!(memory.get("devops", "last_task"), None);
}

#[tokio::test]
async fn prompts_inside_the_window_are_rejected_without_side_effects() {
    let orchestrator = Orchestrator::with_config(
        Arc::new(AgentRegistry::new()),
        Arc::new(ContextMemory::in_memory()),
        OrchestratorConfig {
            rate_limit_window: Duration::from_secs(3600),
        },
    );
    register_specialists(&orchestrator);

    orchestrator.receive_prompt("generate ui").await.unwrap();

    let err = orchestrator.receive_prompt("generate ui").await.unwrap_err();
    let OrchestratorError::RateLimited { retry_after } = err;
    assert!(retry_after <= Duration::from_secs(3600));

    assert_eq!(orchestrator.memory().history().len(), 1);
}

#[tokio::test]
async fn every_prompt_is_recorded_in_history_most_recent_last() {
    let orchestrator = orchestrator();
    register_specialists(&orchestrator);

    orchestrator.receive_prompt("generate ui").await.unwrap();
    orchestrator.receive_prompt("write the readme").await.unwrap();

    let history = orchestrator.memory().history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].prompt, "generate ui");
    assert_eq!(history[1].prompt, "write the readme");
}
