use std::sync::{Arc, RwLock};

use tokio::sync::Mutex;

use super::completion::{ChatMessage, CompletionClient};
use super::errors::{AgentError, AgentResult};
use super::messages::MessageMeta;
use super::types::{AgentProfile, AgentReply, AgentSnapshot};
use crate::domain::agent::{AgentId, AgentKind, AgentStatus};
use crate::domain::message::{Message, NewMessage, SYSTEM_SENDER};
use crate::domain::repositories::Repositories;

/// One LLM-backed conversational capability
///
/// Tracks its own status (`idle -> busy -> {idle | error}`) and appends every
/// inbound and outbound exchange to the message log once it has a persisted
/// identity. Calls on the same agent are serialized by the conversation lock,
/// so `busy` spans exactly one in-flight call.
pub struct Agent {
    profile: AgentProfile,
    id: RwLock<Option<AgentId>>,
    status: RwLock<AgentStatus>,
    context: Mutex<Vec<ChatMessage>>,
    completion: Arc<dyn CompletionClient>,
    repos: Repositories,
}

/// Resets the in-memory status to `error` if a call is abandoned while busy
struct BusyGuard<'a> {
    status: &'a RwLock<AgentStatus>,
    armed: bool,
}

impl<'a> BusyGuard<'a> {
    fn engage(status: &'a RwLock<AgentStatus>) -> Self {
        write_status(status, AgentStatus::Busy);
        Self {
            status,
            armed: true,
        }
    }

    fn finish(mut self, status: AgentStatus) {
        write_status(self.status, status);
        self.armed = false;
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            write_status(self.status, AgentStatus::Error);
        }
    }
}

fn write_status(lock: &RwLock<AgentStatus>, status: AgentStatus) {
    match lock.write() {
        Ok(mut guard) => *guard = status,
        Err(poisoned) => *poisoned.into_inner() = status,
    }
}

fn llm_reason(err: AgentError) -> String {
    match err {
        AgentError::LlmError(reason) => reason,
        other => other.to_string(),
    }
}

impl Agent {
    pub fn new(
        profile: AgentProfile,
        completion: Arc<dyn CompletionClient>,
        repos: Repositories,
    ) -> Self {
        let context = vec![ChatMessage::system(profile.system_prompt.clone())];
        Self {
            profile,
            id: RwLock::new(None),
            status: RwLock::new(AgentStatus::Idle),
            context: Mutex::new(context),
            completion,
            repos,
        }
    }

    pub fn id(&self) -> Option<AgentId> {
        match self.id.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Adopt the identity of a persisted record
    pub(crate) fn attach(&self, id: AgentId) {
        match self.id.write() {
            Ok(mut guard) => *guard = Some(id),
            Err(poisoned) => *poisoned.into_inner() = Some(id),
        }
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub fn role(&self) -> &str {
        &self.profile.role
    }

    pub fn kind(&self) -> AgentKind {
        self.profile.kind
    }

    pub fn model(&self) -> &str {
        &self.profile.model
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn status(&self) -> AgentStatus {
        match self.status.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub(crate) fn repositories(&self) -> &Repositories {
        &self.repos
    }

    /// Sets the in-memory status and mirrors it to the persisted record
    ///
    /// No-op on storage when the agent has no persisted identity yet.
    pub async fn update_status(&self, status: AgentStatus) -> AgentResult<()> {
        write_status(&self.status, status);
        if let Some(id) = self.id() {
            self.repos.agents.update_status(id, status).await?;
        }
        Ok(())
    }

    async fn mirror_status(&self, status: AgentStatus) {
        if let Some(id) = self.id() {
            if let Err(e) = self.repos.agents.update_status(id, status).await {
                tracing::warn!(agent = %self.profile.name, error = %e, "Failed to persist agent status");
            }
        }
    }

    /// Appends one entry to this agent's message log
    ///
    /// Returns `Ok(None)` when the agent has no persisted identity.
    pub async fn log_message(
        &self,
        content: &str,
        sender: &str,
        meta: MessageMeta,
    ) -> AgentResult<Option<Message>> {
        let Some(id) = self.id() else {
            return Ok(None);
        };

        let message = self
            .repos
            .messages
            .append(NewMessage::new(id, sender, content, meta.to_value()))
            .await?;

        Ok(Some(message))
    }

    /// Sends `content` to the agent and waits for its reply
    ///
    /// `from` is the sender label of the inbound entry, `system` when absent.
    /// A completion failure is logged, leaves the agent in `error` and comes
    /// back as `AgentReply::Failed`. Storage failures are returned as `Err`
    /// and also leave the agent in `error`.
    pub async fn send_message(&self, content: &str, from: Option<&str>) -> AgentResult<AgentReply> {
        let mut context = self.context.lock().await;
        let guard = BusyGuard::engage(&self.status);
        self.mirror_status(AgentStatus::Busy).await;

        if let Err(e) = self
            .log_message(content, from.unwrap_or(SYSTEM_SENDER), MessageMeta::Incoming)
            .await
        {
            self.mirror_status(AgentStatus::Error).await;
            return Err(e);
        }

        context.push(ChatMessage::user(content));
        tracing::debug!(agent = %self.profile.name, turns = context.len(), "Calling completion service");

        match self.completion.complete(&self.profile.model, &context).await {
            Ok(text) => {
                context.push(ChatMessage::assistant(text.clone()));
                if let Err(e) = self
                    .log_message(&text, &self.profile.name, MessageMeta::Outgoing)
                    .await
                {
                    self.mirror_status(AgentStatus::Error).await;
                    return Err(e);
                }

                guard.finish(AgentStatus::Idle);
                self.mirror_status(AgentStatus::Idle).await;
                Ok(AgentReply::Completed { text })
            }
            Err(err) => {
                context.pop();
                let reason = llm_reason(err);
                tracing::warn!(agent = %self.profile.name, error = %reason, "Agent call failed");

                guard.finish(AgentStatus::Error);
                self.mirror_status(AgentStatus::Error).await;

                let reply = AgentReply::Failed {
                    reason: reason.clone(),
                };
                self.log_message(
                    &reply.text(),
                    &self.profile.name,
                    MessageMeta::Error {
                        error: reason,
                        tool: None,
                    },
                )
                .await?;

                Ok(reply)
            }
        }
    }

    /// The most recent `limit` messages, oldest first; empty if unpersisted
    pub async fn conversation_history(&self, limit: u32) -> AgentResult<Vec<Message>> {
        match self.id() {
            Some(id) => Ok(self.repos.messages.recent_for_agent(id, limit).await?),
            None => Ok(Vec::new()),
        }
    }

    pub fn describe(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id(),
            name: self.profile.name.clone(),
            role: self.profile.role.clone(),
            kind: self.profile.kind,
            status: self.status(),
            description: self.profile.description.clone(),
        }
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id())
            .field("name", &self.profile.name)
            .field("kind", &self.profile.kind)
            .field("status", &self.status())
            .finish()
    }
}
