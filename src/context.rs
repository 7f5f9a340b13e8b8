use std::sync::Arc;

use sqlx::SqlitePool;

use crate::agents::completion::CompletionClient;
use crate::agents::errors::AgentResult;
use crate::agents::registry::{AgentModels, AgentRegistry};
use crate::config::{Config, LlmProvider};
use crate::domain::repositories::{Repositories, RepositoryError};
use crate::domain::search::SearchService;
use crate::execution::bridge::ExecutionBridge;
use crate::execution::job_queue::JobQueue;
use crate::infrastructure::database;
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::knowledge_base::InMemoryKnowledgeBase;
use crate::infrastructure::llm::{OpenAiCompletionClient, ScriptedCompletionClient};
use crate::infrastructure::repositories::sqlite_repositories;
use crate::services::agent_service::AgentService;
use crate::services::workflow_orchestrator::WorkflowOrchestrator;

/// Every long-lived component of one running system
///
/// Constructed once at startup and shared by reference. Tests build their
/// own isolated contexts.
pub struct AppContext {
    pub config: Config,
    pub pool: SqlitePool,
    pub repos: Repositories,
    pub events: Arc<EventBus>,
    pub knowledge_base: Arc<InMemoryKnowledgeBase>,
    pub registry: Arc<AgentRegistry>,
    pub agents: Arc<AgentService>,
    pub workflows: Arc<WorkflowOrchestrator>,
    pub jobs: Arc<JobQueue>,
    // Declared last so the runtime outlives everything that runs on it
    pub bridge: Arc<ExecutionBridge>,
}

impl AppContext {
    pub fn builder(config: Config) -> AppContextBuilder {
        AppContextBuilder {
            config,
            completion: None,
            search: None,
        }
    }
}

pub struct AppContextBuilder {
    config: Config,
    completion: Option<Arc<dyn CompletionClient>>,
    search: Option<Arc<dyn SearchService>>,
}

impl AppContextBuilder {
    /// Use `client` instead of the configured completion provider
    pub fn completion_client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.completion = Some(client);
        self
    }

    /// Use `search` instead of the in-memory knowledge base
    pub fn search_service(mut self, search: Arc<dyn SearchService>) -> Self {
        self.search = Some(search);
        self
    }

    fn completion_from_config(config: &Config) -> AgentResult<Arc<dyn CompletionClient>> {
        match (config.llm_provider, &config.openai_api_key) {
            (LlmProvider::OpenAi, Some(key)) => Ok(Arc::new(OpenAiCompletionClient::new(
                key.clone(),
                config.openai_base_url.clone(),
                config.llm_timeout,
            )?)),
            _ => Ok(Arc::new(ScriptedCompletionClient::new())),
        }
    }

    /// Builds the context; must be called from a synchronous thread
    pub fn build(self) -> AgentResult<AppContext> {
        let config = self.config;
        let bridge = Arc::new(ExecutionBridge::new(config.bridge_worker_threads)?);

        let url = config.database_url.clone();
        let max_connections = config.max_connections;
        let pool = bridge.run(async move {
            let pool = database::connect(&url, max_connections).await?;
            database::migrate(&pool).await?;
            Ok::<_, RepositoryError>(pool)
        })??;
        tracing::info!("Database connected successfully");

        let repos = sqlite_repositories(pool.clone());
        let events = Arc::new(EventBus::default());

        let knowledge_base = Arc::new(InMemoryKnowledgeBase::new());
        if config.seed_knowledge_base && knowledge_base.is_empty() {
            let seeded = knowledge_base.seed_sample_data();
            tracing::info!(documents = seeded, "Knowledge base seeded");
        }
        let search: Arc<dyn SearchService> = match self.search {
            Some(search) => search,
            None => knowledge_base.clone(),
        };

        let completion = match self.completion {
            Some(client) => client,
            None => Self::completion_from_config(&config)?,
        };

        let registry = Arc::new(AgentRegistry::new(
            completion,
            Some(search),
            repos.clone(),
            events.clone(),
            AgentModels {
                default_model: config.default_model.clone(),
                advanced_model: config.advanced_model.clone(),
            },
        ));

        let agents = Arc::new(AgentService::new(
            bridge.clone(),
            registry.clone(),
            repos.clone(),
        ));
        let workflows = Arc::new(WorkflowOrchestrator::new(
            bridge.clone(),
            registry.clone(),
            repos.clone(),
            events.clone(),
        ));
        let jobs = Arc::new(JobQueue::new(bridge.clone(), config.job_poll_interval));

        Ok(AppContext {
            config,
            pool,
            repos,
            events,
            knowledge_base,
            registry,
            agents,
            workflows,
            jobs,
            bridge,
        })
    }
}

impl AppContext {
    /// Stops the job worker, idles every agent and closes the pool
    pub fn shutdown(&self) -> AgentResult<()> {
        self.jobs.stop();
        self.agents.shutdown()?;

        let pool = self.pool.clone();
        self.bridge.run(async move { pool.close().await })?;
        tracing::info!("Application context shut down");
        Ok(())
    }
}
