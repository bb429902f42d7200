//! Shared types used across the dbchat runtime.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Agent state machine
// ---------------------------------------------------------------------------

/// Phases a single query passes through inside the agent loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentPhase {
    /// Waiting on the model provider for the next reply.
    AwaitingModel,
    /// Running the tool calls the model asked for, in emission order.
    DispatchingTools,
    /// The model answered without tool calls.
    Done,
    /// Provider failure, unknown tool or exhausted iteration budget.
    Failed,
}

impl fmt::Display for AgentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingModel => write!(f, "awaiting_model"),
            Self::DispatchingTools => write!(f, "dispatching_tools"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// A single entry in the conversation sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    System {
        content: String,
    },
    Human {
        content: String,
    },
    Ai {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    Tool(ToolResult),
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self::Human {
            content: content.into(),
        }
    }

    pub fn ai(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self::Ai {
            content: content.into(),
            tool_calls,
        }
    }

    /// Textual content regardless of variant.
    pub fn content(&self) -> &str {
        match self {
            Self::System { content } | Self::Human { content } | Self::Ai { content, .. } => {
                content
            }
            Self::Tool(result) => &result.content,
        }
    }

    /// Tool calls still pending on an AI message (empty for other variants).
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Self::Ai { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Self::System { .. })
    }

    pub fn is_human(&self) -> bool {
        matches!(self, Self::Human { .. })
    }
}

/// A tool call request from the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlates the eventual [`ToolResult`] with this request.
    pub call_id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(
        call_id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Outcome of executing a tool. Always textual; failures carry error text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub call_id: String,
    /// Registered name of the tool that produced this result.
    pub name: String,
    pub content: String,
    /// Set when `content` describes a failure. Only used for logging; the
    /// model sees the text either way.
    #[serde(default)]
    pub is_error: bool,
}

// ---------------------------------------------------------------------------
// Inference types
// ---------------------------------------------------------------------------

/// One model turn: either a final answer or a batch of tool calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelReply {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub usage: TokenUsage,
}

impl ModelReply {
    /// A final answer with no tool calls.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// A turn that only requests tools.
    pub fn with_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::default()
        }
    }
}

/// Token usage from an inference call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn accumulate(&mut self, other: &TokenUsage) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(other.prompt_tokens);
        self.completion_tokens = self.completion_tokens.saturating_add(other.completion_tokens);
        self.total_tokens = self.total_tokens.saturating_add(other.total_tokens);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_reads_every_variant() {
        let result = ToolResult {
            call_id: "c1".into(),
            name: "count_rows".into(),
            content: "42".into(),
            is_error: false,
        };
        assert_eq!(Message::system("s").content(), "s");
        assert_eq!(Message::human("h").content(), "h");
        assert_eq!(Message::ai("a", Vec::new()).content(), "a");
        assert_eq!(Message::Tool(result).content(), "42");
    }

    #[test]
    fn tool_calls_only_on_ai_messages() {
        let call = ToolCall::new("c1", "list_tables", json!({}));
        assert_eq!(Message::ai("", vec![call.clone()]).tool_calls(), &[call]);
        assert!(Message::human("hi").tool_calls().is_empty());
    }

    #[test]
    fn usage_accumulates() {
        let mut total = TokenUsage::default();
        total.accumulate(&TokenUsage {
            prompt_tokens: 10,
            completion_tokens: 2,
            total_tokens: 12,
        });
        total.accumulate(&TokenUsage {
            prompt_tokens: 5,
            completion_tokens: 1,
            total_tokens: 6,
        });
        assert_eq!(total.total_tokens, 18);
        assert_eq!(total.prompt_tokens, 15);
    }

    #[test]
    fn usage_saturates_instead_of_wrapping() {
        let mut total = TokenUsage {
            prompt_tokens: u32::MAX - 1,
            completion_tokens: 3,
            total_tokens: u32::MAX,
        };
        total.accumulate(&TokenUsage {
            prompt_tokens: 5,
            completion_tokens: 1,
            total_tokens: 6,
        });
        assert_eq!(total.prompt_tokens, u32::MAX);
        assert_eq!(total.completion_tokens, 4);
        assert_eq!(total.total_tokens, u32::MAX);
    }
}
