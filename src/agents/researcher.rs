use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::agent::Agent;
use super::errors::AgentResult;
use super::messages::MessageMeta;
use super::prompts::{library, vars};
use super::types::AgentProfile;
use crate::domain::agent::AgentKind;
use crate::domain::search::{SearchHit, SearchService};

pub const RESEARCHER_NAME: &str = "Creator";

const SEARCH_RESULTS: usize = 5;

/// Result of researching one topic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchReport {
    pub topic: String,
    pub sources: Vec<SearchHit>,
    pub summary: String,
    pub success: bool,
}

/// The researcher agent: searches the knowledge base and summarizes
pub struct ResearcherAgent {
    agent: Arc<Agent>,
    search: Option<Arc<dyn SearchService>>,
    cache: Mutex<HashMap<String, ResearchReport>>,
}

impl ResearcherAgent {
    pub fn profile(model: &str) -> AgentProfile {
        AgentProfile {
            name: RESEARCHER_NAME.to_string(),
            role: "Researcher and Idea Generator".to_string(),
            kind: AgentKind::Researcher,
            description: "Research agent backed by knowledge base search".to_string(),
            system_prompt: library::RESEARCHER_SYSTEM.to_string(),
            model: model.to_string(),
        }
    }

    pub fn new(agent: Arc<Agent>, search: Option<Arc<dyn SearchService>>) -> Self {
        Self {
            agent,
            search,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn agent(&self) -> &Arc<Agent> {
        &self.agent
    }

    fn cached(&self, topic: &str) -> Option<ResearchReport> {
        self.cache.lock().ok()?.get(topic).cloned()
    }

    /// Researches `topic`, consulting the search service when `use_search`
    ///
    /// A search failure is logged on the agent and research continues without
    /// sources. Successful reports are cached per topic.
    pub async fn research_topic(&self, topic: &str, use_search: bool) -> AgentResult<ResearchReport> {
        if let Some(report) = self.cached(topic) {
            tracing::debug!(topic, "Research cache hit");
            return Ok(report);
        }

        let mut sources = Vec::new();
        if let (true, Some(search)) = (use_search, &self.search) {
            match search.search(topic, SEARCH_RESULTS).await {
                Ok(hits) => sources = hits,
                Err(e) => {
                    tracing::warn!(topic, error = %e, "Knowledge base search failed");
                    self.agent
                        .log_message(
                            &format!("RAG search error: {}", e),
                            self.agent.name(),
                            MessageMeta::Error {
                                error: e,
                                tool: Some("rag".to_string()),
                            },
                        )
                        .await?;
                }
            }
        }

        let excerpts: String = sources
            .iter()
            .enumerate()
            .map(|(i, hit)| format!("[{}] {}\n", i + 1, hit.document))
            .collect();

        let prompt = library::research_summary().render(&vars([
            ("topic", topic.to_string()),
            ("source_count", sources.len().to_string()),
            ("sources", excerpts),
        ]));

        let reply = self.agent.send_message(&prompt, None).await?;
        let report = ResearchReport {
            topic: topic.to_string(),
            sources,
            success: reply.is_success(),
            summary: reply.text(),
        };

        if report.success {
            if let Ok(mut cache) = self.cache.lock() {
                cache.insert(topic.to_string(), report.clone());
            }
        }

        Ok(report)
    }

    /// Asks for 3-5 ideas and returns the bullet lines of the reply
    ///
    /// Falls back to the whole reply when it has no `-` or `•` bullets.
    pub async fn generate_ideas(
        &self,
        context: &str,
        constraints: &[(String, String)],
    ) -> AgentResult<Vec<String>> {
        let constraints = if constraints.is_empty() {
            String::new()
        } else {
            let lines: String = constraints
                .iter()
                .map(|(k, v)| format!("- {}: {}\n", k, v))
                .collect();
            format!("\nConstraints:\n{}", lines)
        };

        let prompt = library::idea_generation().render(&vars([
            ("context", context.to_string()),
            ("constraints", constraints),
        ]));

        let response = self.agent.send_message(&prompt, None).await?.text();
        Ok(parse_ideas(&response))
    }

    /// Records a request for a specialist and returns its text
    pub async fn request_specialist(
        &self,
        role: &str,
        reason: &str,
        capabilities: &[String],
    ) -> AgentResult<String> {
        let mut request = format!("AGENT REQUEST:\nRole: {}\nReason: {}\n", role, reason);
        if !capabilities.is_empty() {
            request.push_str(&format!("Capabilities: {}\n", capabilities.join(", ")));
        }

        self.agent
            .log_message(
                &request,
                self.agent.name(),
                MessageMeta::AgentRequest {
                    role: role.to_string(),
                },
            )
            .await?;

        Ok(request)
    }

    pub async fn clear_cache(&self) -> AgentResult<()> {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
        self.agent
            .log_message("Research cache cleared", self.agent.name(), MessageMeta::System)
            .await?;
        Ok(())
    }
}

fn parse_ideas(response: &str) -> Vec<String> {
    let ideas: Vec<String> = response
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('-') || line.starts_with('•'))
        .map(|line| line.trim_start_matches(['-', '•', ' ']).trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    if ideas.is_empty() {
        vec![response.to_string()]
    } else {
        ideas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dash_and_bullet_lines() {
        let ideas = parse_ideas("Here you go:\n- First idea\n  • Second idea\nnot an idea\n-Third");
        assert_eq!(ideas, vec!["First idea", "Second idea", "Third"]);
    }

    #[test]
    fn falls_back_to_whole_reply() {
        let ideas = parse_ideas("One big idea");
        assert_eq!(ideas, vec!["One big idea"]);
    }
}
