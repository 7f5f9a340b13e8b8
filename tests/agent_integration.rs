//! Integration tests for agents and the registry
//!
//! These tests verify agent behavior against a real SQLite database:
//! - Core agent initialization and identity adoption
//! - Operator messaging, failure reporting and history ordering
//! - Dynamic agent creation, name suffixing and termination

mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use agent_orchestra::agents::{AgentError, AgentReply};
use agent_orchestra::domain::agent::{AgentKind, AgentStatus};
use agent_orchestra::infrastructure::llm::ScriptedCompletionClient;
use agent_orchestra::services::AgentListing;

use common::{build_context, core_agent_id, initialized_context};

#[test]
fn test_initialize_is_idempotent() {
    let (ctx, _) = build_context(ScriptedCompletionClient::new());

    let first = ctx.agents.initialize_core_agents().unwrap();
    assert_eq!(first.get("orchestrator").map(String::as_str), Some("initialized"));
    assert_eq!(first.get("researcher").map(String::as_str), Some("initialized"));
    assert_eq!(first.get("factory").map(String::as_str), Some("initialized"));
    let driver_id = core_agent_id(&ctx, "Driver");

    let second = ctx.agents.initialize_core_agents().unwrap();
    assert_eq!(first, second);
    assert_eq!(core_agent_id(&ctx, "Driver"), driver_id);

    let repos = ctx.repos.clone();
    let records = ctx
        .bridge
        .run(async move { repos.agents.list().await })
        .unwrap()
        .unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.kind.is_core()));
}

#[test]
fn test_concurrent_initialize_persists_each_core_agent_once() {
    const CALLERS: usize = 4;

    for _ in 0..5 {
        let (ctx, _) = build_context(ScriptedCompletionClient::new());
        let ctx = Arc::new(ctx);
        let barrier = Arc::new(Barrier::new(CALLERS));

        let handles: Vec<_> = (0..CALLERS)
            .map(|_| {
                let ctx = ctx.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    ctx.agents.initialize_core_agents().unwrap()
                })
            })
            .collect();
        for handle in handles {
            let status = handle.join().unwrap();
            assert!(!status.contains_key("error"), "{:?}", status);
        }

        let repos = ctx.repos.clone();
        let records = ctx
            .bridge
            .run(async move { repos.agents.list().await })
            .unwrap()
            .unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| ctx.registry.resolve(r.id).is_some()));
    }
}

#[test]
fn test_list_agents_falls_back_to_records_before_initialize() {
    let (ctx, _) = build_context(ScriptedCompletionClient::new());

    let before = ctx.agents.list_agents().unwrap();
    assert!(before.is_empty());

    ctx.agents.initialize_core_agents().unwrap();
    let after = ctx.agents.list_agents().unwrap();
    assert_eq!(after.len(), 3);
    assert!(matches!(&after[0], AgentListing::Live(s) if s.name == "Driver"));
}

#[test]
fn test_operations_before_initialize_are_rejected() {
    let (ctx, _) = build_context(ScriptedCompletionClient::new());

    assert!(matches!(
        ctx.agents.send_message_to_agent(1, "hello"),
        Err(AgentError::NotInitialized)
    ));
    assert!(matches!(
        ctx.agents.create_dynamic_agent("Tester", &[], "qa"),
        Err(AgentError::NotInitialized)
    ));
}

#[test]
fn test_send_message_returns_reply_and_goes_idle() {
    let (ctx, _) = initialized_context(ScriptedCompletionClient::new().reply_when("hello", "hi there"));
    let driver_id = core_agent_id(&ctx, "Driver");

    let result = ctx.agents.send_message_to_agent(driver_id, "hello").unwrap();

    assert!(result.success);
    assert_eq!(result.response.as_deref(), Some("hi there"));
    assert_eq!(result.agent_name, "Driver");
    assert_eq!(result.status, AgentStatus::Idle);

    let history = ctx.agents.conversation_history(driver_id, 10).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].sender, "operator");
    assert_eq!(history[0].content, "hello");
    assert_eq!(history[1].sender, "Driver");
    assert_eq!(history[1].content, "hi there");
}

#[test]
fn test_failed_send_reports_error_and_never_stays_busy() {
    let (ctx, _) =
        initialized_context(ScriptedCompletionClient::new().fail_when("explode", "rate limited"));
    let driver_id = core_agent_id(&ctx, "Driver");

    let result = ctx.agents.send_message_to_agent(driver_id, "explode").unwrap();

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("rate limited"));
    assert_eq!(result.status, AgentStatus::Error);

    let history = ctx.agents.conversation_history(driver_id, 10).unwrap();
    let last = history.last().unwrap();
    assert_eq!(last.content, "Error processing message: rate limited");
    assert_eq!(last.meta["type"], "error");

    // The next call recovers
    let again = ctx.agents.send_message_to_agent(driver_id, "hello").unwrap();
    assert!(again.success);
    assert_eq!(again.status, AgentStatus::Idle);
}

#[test]
fn test_history_keeps_append_order_and_limit() {
    let (ctx, _) = initialized_context(ScriptedCompletionClient::new());
    let driver_id = core_agent_id(&ctx, "Driver");

    for i in 0..3 {
        ctx.agents
            .send_message_to_agent(driver_id, &format!("message {}", i))
            .unwrap();
    }

    let all = ctx.agents.conversation_history(driver_id, 50).unwrap();
    assert_eq!(all.len(), 6);
    assert!(all.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert!(all.windows(2).all(|w| w[0].id < w[1].id));

    let recent = ctx.agents.conversation_history(driver_id, 2).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].content, "message 2");
}

#[test]
fn test_send_to_unknown_agent_is_not_found() {
    let (ctx, _) = initialized_context(ScriptedCompletionClient::new());

    let result = ctx.agents.send_message_to_agent(9999, "hello");
    assert!(matches!(result, Err(AgentError::AgentNotFound(_))));
    assert!(ctx.agents.agent_status(9999).unwrap().is_none());
}

#[test]
fn test_create_then_terminate_dynamic_agent() {
    let (ctx, _) = initialized_context(ScriptedCompletionClient::new());

    let created = ctx
        .agents
        .create_dynamic_agent("Tester", &["coding".to_string()], "need QA")
        .unwrap();
    assert!(created.success);
    let snapshot = created.agent.unwrap();
    assert_eq!(snapshot.name, "Tester");
    assert_eq!(snapshot.kind, AgentKind::Dynamic);
    let id = snapshot.id.expect("dynamic agent is persisted");

    let ledger = ctx.agents.created_agents().unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].capabilities, vec!["coding".to_string()]);

    assert!(ctx.agents.terminate_agent(id).unwrap());
    assert!(ctx.registry.resolve(id).is_none());
    assert!(ctx.agents.agent_status(id).unwrap().is_none());
    assert!(ctx.agents.created_agents().unwrap().is_empty());

    let repos = ctx.repos.clone();
    let record = ctx
        .bridge
        .run(async move { repos.agents.find_by_id(id).await })
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(record.status, AgentStatus::Terminated);

    // Nothing left to remove
    assert!(!ctx.agents.terminate_agent(id).unwrap());
}

#[test]
fn test_core_agents_cannot_be_terminated() {
    let (ctx, _) = initialized_context(ScriptedCompletionClient::new());

    for name in ["Driver", "Creator", "Generator"] {
        let id = core_agent_id(&ctx, name);
        for _ in 0..2 {
            assert!(!ctx.agents.terminate_agent(id).unwrap());
        }
        assert!(ctx.registry.resolve(id).is_some());
    }
}

#[test]
fn test_duplicate_names_are_suffixed() {
    let (ctx, _) = initialized_context(ScriptedCompletionClient::new());

    let first = ctx.agents.create_dynamic_agent("Tester", &[], "one").unwrap();
    let second = ctx.agents.create_dynamic_agent("Tester", &[], "two").unwrap();

    let first = first.agent.unwrap();
    let second = second.agent.unwrap();
    assert_eq!(first.name, "Tester");
    assert_eq!(second.name, "Tester-2");
    assert_ne!(first.id, second.id);
    assert_eq!(ctx.registry.dynamic_count(), 2);
}

#[test]
fn test_design_failure_falls_back_to_template_prompt() {
    let (ctx, _) = initialized_context(
        ScriptedCompletionClient::new().fail_when("Design an agent specification", "offline"),
    );

    let created = ctx
        .agents
        .create_dynamic_agent("Data Analyst", &["research".to_string()], "reports")
        .unwrap();
    assert!(created.success);

    let agent = ctx.registry.resolve_by_name("DataAnalyst").unwrap();
    assert!(agent.profile().system_prompt.contains("Data Analyst"));
}

#[test]
fn test_route_between_agents() {
    let (ctx, _) = initialized_context(ScriptedCompletionClient::new().reply_when("status?", "all good"));
    let driver_id = core_agent_id(&ctx, "Driver");

    let reply = ctx
        .agents
        .route_message(driver_id, "Creator", "status?")
        .unwrap();
    assert_eq!(
        reply,
        Some(AgentReply::Completed {
            text: "all good".to_string()
        })
    );

    let creator_id = core_agent_id(&ctx, "Creator");
    let history = ctx.agents.conversation_history(creator_id, 10).unwrap();
    assert_eq!(history[0].sender, "Driver");

    assert!(ctx
        .agents
        .route_message(driver_id, "Nobody", "status?")
        .unwrap()
        .is_none());
}

#[test]
fn test_research_uses_knowledge_base() {
    let (ctx, _) = initialized_context(ScriptedCompletionClient::new());

    let report = ctx.agents.research_topic("Python programming language").unwrap();

    assert!(report.success);
    assert!(!report.sources.is_empty());
    assert!(report.sources.len() <= 5);
    assert!(report
        .sources
        .windows(2)
        .all(|w| w[0].distance <= w[1].distance));
}

#[test]
fn test_overview_counts() {
    let (ctx, _) = initialized_context(ScriptedCompletionClient::new());
    ctx.workflows.create_workflow("Demo", None, "build X").unwrap();
    ctx.agents.create_dynamic_agent("Tester", &[], "qa").unwrap();

    let overview = ctx.agents.overview().unwrap();
    assert_eq!(overview.total_agents, 4);
    assert_eq!(overview.dynamic_agents, 1);
    assert_eq!(overview.total_workflows, 1);
    assert_eq!(overview.workflows_by_status.get("pending"), Some(&1));
}
