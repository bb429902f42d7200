//! Core tool-calling loop: Ask → Act → Observe, bounded per query.
//!
//! For one question the agent:
//! 1. Retrieves background passages and builds the contextualized question
//! 2. Calls the model with the working messages and tool definitions
//! 3. Stops when the reply has no tool calls
//! 4. Otherwise runs each tool call in order, appends the results, repeats

use crate::agent::context;
use crate::agent::history::History;
use crate::config::DbChatConfig;
use crate::error::AgentError;
use crate::inference::ModelProvider;
use crate::logging::redact_sql;
use crate::retrieval::ContextRetriever;
use crate::tools::ToolRegistry;
use crate::types::{AgentPhase, Message, TokenUsage};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Per-query limits.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSettings {
    /// Model round-trips allowed before giving up.
    pub max_iterations: usize,
    /// Passages requested from the retriever.
    pub retrieval_k: usize,
    /// Prior messages sent to the model (0 = all).
    pub history_window: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            retrieval_k: 10,
            history_window: 40,
        }
    }
}

impl From<&DbChatConfig> for AgentSettings {
    fn from(config: &DbChatConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            retrieval_k: config.retrieval_k,
            history_window: config.history_window,
        }
    }
}

/// Final answer for one query.
#[derive(Debug, Clone)]
pub struct AgentReply {
    /// Markdown answer from the model's last turn.
    pub answer: String,
    /// Model calls made, including the final one.
    pub iterations: usize,
    /// Token usage summed over every model call.
    pub usage: TokenUsage,
    /// Full working message list, tool traffic included.
    pub transcript: Vec<Message>,
}

/// Drives the model, the retriever and the tool registry for one query.
pub struct Agent {
    provider: Arc<dyn ModelProvider>,
    retriever: Arc<dyn ContextRetriever>,
    registry: ToolRegistry,
    settings: AgentSettings,
}

impl Agent {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        retriever: Arc<dyn ContextRetriever>,
        registry: ToolRegistry,
        settings: AgentSettings,
    ) -> Self {
        Self {
            provider,
            retriever,
            registry,
            settings,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Answer `query` against a copy of `history`. The caller's history is
    /// never touched.
    pub async fn run(&self, query: &str, history: &History) -> Result<AgentReply, AgentError> {
        info!("User request: {}", redact_sql(query));

        let passages = self
            .retriever
            .retrieve(query, self.settings.retrieval_k)
            .await?;
        debug!("Retrieved {} context passages", passages.len());

        let mut messages = context::build_messages(history.messages(), self.settings.history_window);
        messages.push(Message::human(context::contextualize(&passages, query)));

        let max_iterations = self.settings.max_iterations;
        let mut usage = TokenUsage::default();

        for iteration in 1..=max_iterations {
            debug!("[Iteration {}] {}", iteration, AgentPhase::AwaitingModel);

            let reply = match self
                .provider
                .chat(&messages, self.registry.definitions())
                .await
            {
                Ok(reply) => reply,
                Err(e) => {
                    warn!("[Iteration {}] {}: {}", iteration, AgentPhase::Failed, e);
                    return Err(e.into());
                }
            };
            usage.accumulate(&reply.usage);
            messages.push(Message::ai(reply.content.clone(), reply.tool_calls.clone()));

            if reply.tool_calls.is_empty() {
                debug!("[Iteration {}] {}", iteration, AgentPhase::Done);
                info!(
                    "Answered in {} iterations ({} tokens)",
                    iteration, usage.total_tokens
                );
                return Ok(AgentReply {
                    answer: reply.content,
                    iterations: iteration,
                    usage,
                    transcript: messages,
                });
            }

            debug!(
                "[Iteration {}] {} ({} calls)",
                iteration,
                AgentPhase::DispatchingTools,
                reply.tool_calls.len()
            );
            for call in &reply.tool_calls {
                let result = match self.registry.call(call).await {
                    Ok(result) => result,
                    Err(e) => {
                        warn!("[Iteration {}] {}: {}", iteration, AgentPhase::Failed, e);
                        return Err(e.into());
                    }
                };
                messages.push(Message::Tool(result));
            }
        }

        warn!(
            "{}: no answer after {} iterations",
            AgentPhase::Failed,
            max_iterations
        );
        Err(AgentError::IterationBudgetExceeded { max_iterations })
    }
}
