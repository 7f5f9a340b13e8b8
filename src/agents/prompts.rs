// Prompt templates for LLM interactions
//
// System prompts for the three core agents and the user templates the role
// wrappers render before calling the completion service.

use std::collections::HashMap;

/// Prompt template structure
pub struct PromptTemplate {
    pub name: String,
    pub version: String,
    pub system: String,
    pub user_template: String,
}

impl PromptTemplate {
    /// Render the user template, replacing every `{{key}}` with its value
    ///
    /// Placeholders without a value are left untouched.
    pub fn render(&self, variables: &HashMap<String, String>) -> String {
        let mut rendered = self.user_template.clone();
        for (key, value) in variables {
            rendered = rendered.replace(&format!("{{{{{}}}}}", key), value);
        }
        rendered
    }
}

/// Build a variables map from `(key, value)` pairs
pub fn vars<const N: usize>(pairs: [(&str, String); N]) -> HashMap<String, String> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

pub mod library {
    use super::PromptTemplate;

    pub const ORCHESTRATOR_SYSTEM: &str = "You are the CEO (Driver agent) of a small virtual company of AI agents.\n\n\
        You receive tasks from the human operator, break them into manageable subtasks, \
        delegate research to the Creator agent and staffing to the Generator agent, \
        monitor workflow progress and report results back to the operator.\n\n\
        When delegating, state what needs to be done, who should do it, the expected \
        outcome and its priority. If a task needs a new specialist, request it from \
        the Generator. Keep answers clear, concise and outcome focused.";

    pub const RESEARCHER_SYSTEM: &str = "You are the Creator agent, a researcher and idea generator.\n\n\
        You research topics using the internal knowledge base, generate creative and \
        practical ideas, analyse information and turn findings into actionable insights. \
        Cite the sources you were given. If implementation needs a specialist, request \
        one from the Generator agent with a clear specification.";

    pub const FACTORY_SYSTEM: &str = "You are the Generator agent, the HR manager and agent creator.\n\n\
        You receive requests for specialised agents, design their specification (name, \
        role, capabilities, system prompt, tools, model) and register them in the system. \
        Be precise and technical, and define clear success criteria for every agent you design.";

    pub fn operator_task() -> PromptTemplate {
        PromptTemplate {
            name: "operator_task".to_string(),
            version: "1.0.0".to_string(),
            system: ORCHESTRATOR_SYSTEM.to_string(),
            user_template: "New task from operator: {{task}}".to_string(),
        }
    }

    pub fn research_summary() -> PromptTemplate {
        PromptTemplate {
            name: "research_summary".to_string(),
            version: "1.0.0".to_string(),
            system: RESEARCHER_SYSTEM.to_string(),
            user_template: "Research topic: {{topic}}\n\n\
                            Sources found: {{source_count}}\n\
                            {{sources}}\
                            Please provide a comprehensive summary of this topic."
                .to_string(),
        }
    }

    pub fn idea_generation() -> PromptTemplate {
        PromptTemplate {
            name: "idea_generation".to_string(),
            version: "1.0.0".to_string(),
            system: RESEARCHER_SYSTEM.to_string(),
            user_template: "Generate creative ideas for:\n{{context}}\n\
                            {{constraints}}\
                            \nProvide 3-5 innovative and practical ideas."
                .to_string(),
        }
    }

    pub fn agent_design() -> PromptTemplate {
        PromptTemplate {
            name: "agent_design".to_string(),
            version: "1.0.0".to_string(),
            system: FACTORY_SYSTEM.to_string(),
            user_template: "Design an agent specification for:\n\
                            Role: {{role}}\n\
                            Capabilities: {{capabilities}}\n\
                            {{requirements}}\
                            \nProvide a detailed system prompt for this agent that includes:\n\
                            1. Clear role definition\n\
                            2. Key responsibilities\n\
                            3. Capabilities and limitations\n\
                            4. Communication style\n\
                            5. Success criteria"
                .to_string(),
        }
    }

    /// Used when the completion service cannot design a prompt itself
    pub fn fallback_agent_prompt() -> PromptTemplate {
        PromptTemplate {
            name: "fallback_agent_prompt".to_string(),
            version: "1.0.0".to_string(),
            system: String::new(),
            user_template: "You are {{role}}, a specialized agent.\n\n\
                            Your capabilities: {{capabilities}}.\n\
                            Work carefully within these capabilities, say clearly when a \
                            request falls outside them, and report results in a concise, \
                            structured form."
                .to_string(),
        }
    }
}
