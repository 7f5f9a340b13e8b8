//! Shared fixtures for integration tests
//!
//! Every context gets its own in-memory SQLite database and an offline
//! scripted completion client, so tests never share state or touch the
//! network.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use agent_orchestra::config::Config;
use agent_orchestra::context::AppContext;
use agent_orchestra::infrastructure::llm::ScriptedCompletionClient;

pub fn test_config() -> Config {
    Config {
        bridge_worker_threads: 2,
        job_poll_interval: Duration::from_millis(10),
        ..Config::default()
    }
}

/// Builds an isolated context around `client`; call from a plain thread
pub fn build_context(client: ScriptedCompletionClient) -> (AppContext, Arc<ScriptedCompletionClient>) {
    let client = Arc::new(client);
    let ctx = AppContext::builder(test_config())
        .completion_client(client.clone())
        .build()
        .expect("Failed to build test context");
    (ctx, client)
}

/// Builds a context with the three core agents ready
pub fn initialized_context(client: ScriptedCompletionClient) -> (AppContext, Arc<ScriptedCompletionClient>) {
    let (ctx, client) = build_context(client);
    let status = ctx
        .agents
        .initialize_core_agents()
        .expect("Failed to initialize core agents");
    assert!(
        !status.contains_key("error"),
        "core agents failed to initialize: {:?}",
        status
    );
    (ctx, client)
}

/// Persisted id of a core agent
pub fn core_agent_id(ctx: &AppContext, name: &str) -> i64 {
    ctx.registry
        .resolve_by_name(name)
        .and_then(|agent| agent.id())
        .expect("core agent should be persisted")
}
