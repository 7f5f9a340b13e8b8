use std::process::ExitCode;
use std::sync::Arc;

use agent_orchestra::agents::AgentResult;
use agent_orchestra::api;
use agent_orchestra::config::Config;
use agent_orchestra::context::AppContext;

fn run() -> AgentResult<()> {
    let config = Config::from_env()?;
    let bind_addr = config.bind_addr;

    tracing::info!("Connecting to database...");
    let ctx = Arc::new(AppContext::builder(config).build()?);

    let status = ctx.agents.initialize_core_agents()?;
    match status.get("error") {
        Some(error) => tracing::warn!(%error, "Core agents partially initialized"),
        None => tracing::info!(?status, "Core agents ready"),
    }

    ctx.jobs.start()?;

    let app = api::router(ctx.clone());
    let served = ctx.bridge.run(async move {
        let listener = tokio::net::TcpListener::bind(bind_addr).await?;
        tracing::info!("Server listening on {}", bind_addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutdown signal received");
            })
            .await
    })?;
    if let Err(e) = served {
        tracing::error!(error = %e, "Server failed");
    }

    ctx.shutdown()
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}
