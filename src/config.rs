use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::agents::errors::{AgentError, AgentResult};

/// Which completion backend the agents talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    /// Scripted offline replies; no network access
    Offline,
}

impl FromStr for LlmProvider {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAi),
            "offline" => Ok(LlmProvider::Offline),
            other => Err(AgentError::ConfigError(format!(
                "Unknown LLM_PROVIDER: {}",
                other
            ))),
        }
    }
}

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub llm_provider: LlmProvider,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub default_model: String,
    pub advanced_model: String,
    pub llm_timeout: Duration,
    pub bridge_worker_threads: usize,
    pub job_poll_interval: Duration,
    pub seed_knowledge_base: bool,
    pub bind_addr: SocketAddr,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 5,
            llm_provider: LlmProvider::Offline,
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            default_model: "gpt-4o-mini".to_string(),
            advanced_model: "gpt-4o".to_string(),
            llm_timeout: Duration::from_secs(60),
            bridge_worker_threads: 2,
            job_poll_interval: Duration::from_millis(100),
            seed_knowledge_base: true,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
        }
    }
}

fn var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: FromStr>(key: &str, default: T) -> AgentResult<T> {
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AgentError::ConfigError(format!("Invalid value for {}: {}", key, raw))),
        None => Ok(default),
    }
}

impl Config {
    /// Reads configuration from the environment, loading `.env` first
    pub fn from_env() -> AgentResult<Self> {
        dotenv::dotenv().ok();
        let defaults = Config::default();

        let openai_api_key = var("OPENAI_API_KEY");
        let llm_provider = match var("LLM_PROVIDER") {
            Some(raw) => raw.parse()?,
            None if openai_api_key.is_some() => LlmProvider::OpenAi,
            None => {
                tracing::warn!("OPENAI_API_KEY not set, using offline completion client");
                LlmProvider::Offline
            }
        };
        if llm_provider == LlmProvider::OpenAi && openai_api_key.is_none() {
            return Err(AgentError::ConfigError(
                "LLM_PROVIDER=openai requires OPENAI_API_KEY".to_string(),
            ));
        }

        let database_url = var("DATABASE_URL").unwrap_or_else(|| {
            tracing::warn!("DATABASE_URL not set, using default");
            "sqlite://agent_orchestra.db?mode=rwc".to_string()
        });

        let threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(defaults.bridge_worker_threads);

        Ok(Self {
            database_url,
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS", defaults.max_connections)?,
            llm_provider,
            openai_api_key,
            openai_base_url: var("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            default_model: var("DEFAULT_MODEL").unwrap_or(defaults.default_model),
            advanced_model: var("ADVANCED_MODEL").unwrap_or(defaults.advanced_model),
            llm_timeout: Duration::from_secs(parse_var("LLM_TIMEOUT_SECS", 60u64)?),
            bridge_worker_threads: parse_var("BRIDGE_WORKER_THREADS", threads)?,
            job_poll_interval: Duration::from_millis(parse_var("JOB_POLL_INTERVAL_MS", 100u64)?),
            seed_knowledge_base: parse_var("SEED_KNOWLEDGE_BASE", true)?,
            bind_addr: parse_var("BIND_ADDR", defaults.bind_addr)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_targets_in_memory_database() {
        let config = Config::default();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.llm_provider, LlmProvider::Offline);
        assert_eq!(config.job_poll_interval, Duration::from_millis(100));
    }

    #[test]
    fn provider_parses_case_insensitively() {
        assert_eq!("OpenAI".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAi);
        assert_eq!(" offline ".parse::<LlmProvider>().unwrap(), LlmProvider::Offline);
        assert!(matches!(
            "anthropic".parse::<LlmProvider>(),
            Err(AgentError::ConfigError(_))
        ));
    }

    #[test]
    fn invalid_number_is_config_error() {
        std::env::set_var("AGENT_ORCHESTRA_TEST_NUMBER", "ten");
        let result = parse_var::<u64>("AGENT_ORCHESTRA_TEST_NUMBER", 1);
        std::env::remove_var("AGENT_ORCHESTRA_TEST_NUMBER");

        assert!(matches!(result, Err(AgentError::ConfigError(_))));
    }

    #[test]
    fn missing_value_uses_default() {
        let value = parse_var::<u64>("AGENT_ORCHESTRA_TEST_UNSET", 42).unwrap();
        assert_eq!(value, 42);
    }
}
