//! Integration tests for the role wrappers around the core agents
//!
//! Covers the researcher cache, idea parsing and search failures, plus the
//! coordination records the orchestrator and researcher leave in their logs.

mod common;

use std::sync::Arc;

use agent_orchestra::context::AppContext;
use agent_orchestra::domain::search::{SearchHit, SearchService};
use agent_orchestra::infrastructure::llm::ScriptedCompletionClient;
use async_trait::async_trait;

use common::{core_agent_id, initialized_context, test_config};

struct UnreachableSearch;

#[async_trait]
impl SearchService for UnreachableSearch {
    async fn search(&self, _query: &str, _k: usize) -> Result<Vec<SearchHit>, String> {
        Err("vector store unreachable".to_string())
    }

    async fn count(&self) -> Result<usize, String> {
        Err("vector store unreachable".to_string())
    }
}

fn research_calls(client: &ScriptedCompletionClient, topic: &str) -> usize {
    let needle = format!("Research topic: {}", topic);
    client
        .calls()
        .iter()
        .filter(|call| call.prompt.contains(&needle))
        .count()
}

#[test]
fn test_research_is_cached_until_cleared() {
    let (ctx, client) = initialized_context(ScriptedCompletionClient::new());
    let researcher = ctx.registry.researcher().unwrap();

    let first = {
        let researcher = researcher.clone();
        ctx.bridge
            .run(async move { researcher.research_topic("caching", false).await })
            .unwrap()
            .unwrap()
    };
    assert!(first.success);
    assert!(first.sources.is_empty());

    let second = {
        let researcher = researcher.clone();
        ctx.bridge
            .run(async move { researcher.research_topic("caching", false).await })
            .unwrap()
            .unwrap()
    };
    assert_eq!(first, second);
    assert_eq!(research_calls(&client, "caching"), 1);

    {
        let researcher = researcher.clone();
        ctx.bridge
            .run(async move { researcher.clear_cache().await })
            .unwrap()
            .unwrap();
    }
    ctx.bridge
        .run(async move { researcher.research_topic("caching", false).await })
        .unwrap()
        .unwrap();
    assert_eq!(research_calls(&client, "caching"), 2);

    let creator_id = core_agent_id(&ctx, "Creator");
    let history = ctx.agents.conversation_history(creator_id, 50).unwrap();
    assert!(history
        .iter()
        .any(|m| m.content == "Research cache cleared" && m.meta["type"] == "system"));
}

#[test]
fn test_failed_research_is_not_cached() {
    let (ctx, client) = initialized_context(
        ScriptedCompletionClient::new().fail_when("Research topic: flaky", "timeout"),
    );
    let researcher = ctx.registry.researcher().unwrap();

    for _ in 0..2 {
        let researcher = researcher.clone();
        let report = ctx
            .bridge
            .run(async move { researcher.research_topic("flaky", false).await })
            .unwrap()
            .unwrap();
        assert!(!report.success);
    }

    assert_eq!(research_calls(&client, "flaky"), 2);
}

#[test]
fn test_generate_ideas_returns_bullets() {
    let (ctx, client) = initialized_context(ScriptedCompletionClient::new().reply_when(
        "Generate creative ideas",
        "Some thoughts:\n- Batch writes\n• Cache reads\n- Shard by tenant",
    ));
    let researcher = ctx.registry.researcher().unwrap();

    let constraints = vec![("budget".to_string(), "small".to_string())];
    let ideas = ctx
        .bridge
        .run(async move { researcher.generate_ideas("scale the store", &constraints).await })
        .unwrap()
        .unwrap();

    assert_eq!(ideas, vec!["Batch writes", "Cache reads", "Shard by tenant"]);
    let calls = client.calls();
    let prompt = &calls.last().unwrap().prompt;
    assert!(prompt.contains("scale the store"));
    assert!(prompt.contains("- budget: small"));
}

#[test]
fn test_specialist_request_is_logged_on_researcher() {
    let (ctx, _) = initialized_context(ScriptedCompletionClient::new());
    let researcher = ctx.registry.researcher().unwrap();

    let capabilities = vec!["sql".to_string(), "statistics".to_string()];
    let request = ctx
        .bridge
        .run(async move {
            researcher
                .request_specialist("Data Analyst", "numbers needed", &capabilities)
                .await
        })
        .unwrap()
        .unwrap();
    assert!(request.contains("Role: Data Analyst"));
    assert!(request.contains("Capabilities: sql, statistics"));

    let creator_id = core_agent_id(&ctx, "Creator");
    let history = ctx.agents.conversation_history(creator_id, 10).unwrap();
    let last = history.last().unwrap();
    assert_eq!(last.content, request);
    assert_eq!(last.meta["type"], "agent_request");
    assert_eq!(last.meta["role"], "Data Analyst");
}

#[test]
fn test_orchestrator_records_delegations_and_staffing_requests() {
    let (ctx, client) = initialized_context(ScriptedCompletionClient::new());
    let driver = ctx.registry.orchestrator().unwrap();

    let (delegation, request) = ctx
        .bridge
        .run(async move {
            let delegation = driver
                .delegate_to_researcher("survey vector stores", Some("keep it short"))
                .await?;
            let request = driver
                .request_new_agent("Editor", &["proofreading".to_string()], "docs backlog")
                .await?;
            Ok::<_, agent_orchestra::agents::AgentError>((delegation, request))
        })
        .unwrap()
        .unwrap();

    assert!(delegation.starts_with("DELEGATION TO CREATOR:"));
    assert!(delegation.contains("Context: keep it short"));
    assert!(request.contains("Capabilities: proofreading"));
    // Coordination records never reach the completion client
    assert!(client.calls().is_empty());

    let driver_id = core_agent_id(&ctx, "Driver");
    let history = ctx.agents.conversation_history(driver_id, 10).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].meta["type"], "delegation");
    assert_eq!(history[0].meta["target"], "researcher");
    assert_eq!(history[1].meta["type"], "agent_request");
    assert_eq!(history[1].meta["role"], "Editor");
}

#[test]
fn test_search_failure_is_logged_and_research_continues() {
    let ctx = AppContext::builder(test_config())
        .completion_client(Arc::new(ScriptedCompletionClient::new()))
        .search_service(Arc::new(UnreachableSearch))
        .build()
        .unwrap();
    ctx.agents.initialize_core_agents().unwrap();

    let report = ctx.agents.research_topic("graph databases").unwrap();
    assert!(report.success);
    assert!(report.sources.is_empty());

    let creator_id = core_agent_id(&ctx, "Creator");
    let history = ctx.agents.conversation_history(creator_id, 10).unwrap();
    let error = history
        .iter()
        .find(|m| m.meta["type"] == "error")
        .expect("search failure should be logged");
    assert_eq!(error.content, "RAG search error: vector store unreachable");
    assert_eq!(error.meta["tool"], "rag");
}
