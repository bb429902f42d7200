//! One interactive conversation: a history plus the agent that extends it.

use crate::agent::history::History;
use crate::agent::loop_::{Agent, AgentReply};
use crate::error::AgentError;

pub struct Session {
    agent: Agent,
    history: History,
}

impl Session {
    pub fn new(agent: Agent, system_prompt: impl Into<String>) -> Self {
        Self::with_history(agent, History::new(system_prompt))
    }

    pub fn with_history(agent: Agent, history: History) -> Self {
        Self { agent, history }
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Answer `query`. On success exactly one human and one AI message are
    /// appended; on failure history is unchanged.
    pub async fn ask(&mut self, query: &str) -> Result<AgentReply, AgentError> {
        let reply = self.agent.run(query, &self.history).await?;
        self.history.record_exchange(query, reply.answer.as_str());
        Ok(reply)
    }

    /// Forget every exchange, keeping the system prompt.
    pub fn reset(&mut self) {
        self.history.reset();
    }
}
