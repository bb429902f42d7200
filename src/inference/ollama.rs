//! Model inference via a local Ollama server (`/api/chat`).
//!
//! Supports tool-use in Ollama's native format. Streaming responses are
//! newline-delimited JSON and are folded into a single [`ModelReply`].

use crate::config::DbChatConfig;
use crate::error::ProviderError;
use crate::inference::ModelProvider;
use crate::tools::ToolDefinition;
use crate::types::{Message, ModelReply, TokenUsage, ToolCall};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Sampling options sent with every request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationOptions {
    pub temperature: f64,
    pub num_ctx: u32,
    pub seed: u64,
}

impl From<&DbChatConfig> for GenerationOptions {
    fn from(config: &DbChatConfig) -> Self {
        Self {
            temperature: config.temperature,
            num_ctx: config.context_window,
            seed: config.seed,
        }
    }
}

/// Client for the Ollama chat API.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    options: GenerationOptions,
    keep_alive: String,
    stream: bool,
    http: reqwest::Client,
}

// -- Ollama request/response types --------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<MessagePayload<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolPayload<'a>>,
    stream: bool,
    keep_alive: Value,
    options: &'a GenerationOptions,
}

#[derive(Debug, Serialize)]
struct MessagePayload<'a> {
    role: &'static str,
    content: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ToolCallPayload<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ToolCallPayload<'a> {
    function: FunctionCallPayload<'a>,
}

#[derive(Debug, Serialize)]
struct FunctionCallPayload<'a> {
    name: &'a str,
    arguments: &'a Value,
}

#[derive(Debug, Serialize)]
struct ToolPayload<'a> {
    r#type: &'a str,
    function: FunctionPayload<'a>,
}

#[derive(Debug, Serialize)]
struct FunctionPayload<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

/// One response object. Non-streaming replies are a single chunk with
/// `done: true`; streaming replies are many.
#[derive(Debug, Default, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: Option<ResponseMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ResponseToolCall>,
}

#[derive(Debug, Deserialize)]
struct ResponseToolCall {
    #[serde(default)]
    id: Option<String>,
    function: ResponseFunction,
}

#[derive(Debug, Deserialize)]
struct ResponseFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

// -- Reply assembly -------------------------------------------------------------

#[derive(Debug, Default)]
struct ReplyBuilder {
    content: String,
    tool_calls: Vec<ToolCall>,
    usage: TokenUsage,
    chunks: usize,
    done: bool,
}

impl ReplyBuilder {
    fn absorb(&mut self, chunk: ChatChunk) -> Result<(), ProviderError> {
        if let Some(err) = chunk.error {
            return Err(ProviderError::Remote(err));
        }
        self.chunks += 1;
        if let Some(message) = chunk.message {
            if let Some(content) = message.content {
                self.content.push_str(&content);
            }
            self.tool_calls
                .extend(message.tool_calls.into_iter().map(into_tool_call));
        }
        if let Some(n) = chunk.prompt_eval_count {
            self.usage.prompt_tokens = n;
        }
        if let Some(n) = chunk.eval_count {
            self.usage.completion_tokens = n;
        }
        self.done |= chunk.done;
        Ok(())
    }

    fn absorb_line(&mut self, line: &[u8]) -> Result<(), ProviderError> {
        let line = line.trim_ascii();
        if line.is_empty() {
            return Ok(());
        }
        let chunk: ChatChunk =
            serde_json::from_slice(line).map_err(|e| ProviderError::Decode(e.to_string()))?;
        self.absorb(chunk)
    }

    fn finish(mut self) -> Result<ModelReply, ProviderError> {
        if self.chunks == 0 {
            return Err(ProviderError::Decode("empty response body".into()));
        }
        if !self.done {
            debug!("Ollama stream ended without a done marker");
        }
        self.usage.total_tokens = self
            .usage
            .prompt_tokens
            .saturating_add(self.usage.completion_tokens);
        Ok(ModelReply {
            content: self.content,
            tool_calls: self.tool_calls,
            usage: self.usage,
        })
    }
}

/// Arguments may arrive as an object or as a JSON-encoded string. A string
/// that does not parse is passed through so the tool reports it as invalid.
fn into_tool_call(tc: ResponseToolCall) -> ToolCall {
    let arguments = match tc.function.arguments {
        Value::String(raw) if raw.trim().is_empty() => Value::Null,
        Value::String(raw) => serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
        other => other,
    };
    let call_id = tc
        .id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| ulid::Ulid::new().to_string());
    ToolCall {
        call_id,
        name: tc.function.name,
        arguments,
    }
}

fn message_payload(message: &Message) -> MessagePayload<'_> {
    let (role, tool_calls, tool_name) = match message {
        Message::System { .. } => ("system", Vec::new(), None),
        Message::Human { .. } => ("user", Vec::new(), None),
        Message::Ai { tool_calls, .. } => (
            "assistant",
            tool_calls
                .iter()
                .map(|tc| ToolCallPayload {
                    function: FunctionCallPayload {
                        name: &tc.name,
                        arguments: &tc.arguments,
                    },
                })
                .collect(),
            None,
        ),
        Message::Tool(result) => ("tool", Vec::new(), Some(result.name.as_str())),
    };
    MessagePayload {
        role,
        content: message.content(),
        tool_calls,
        tool_name,
    }
}

/// `-1` and `300` go over the wire as numbers, `5m` as a string.
fn keep_alive_value(raw: &str) -> Value {
    match raw.trim().parse::<i64>() {
        Ok(n) => Value::from(n),
        Err(_) => Value::from(raw.trim()),
    }
}

impl OllamaClient {
    /// Create a new client for `model` served at `base_url`.
    pub fn new(base_url: &str, model: &str, options: GenerationOptions) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            options,
            keep_alive: "-1".into(),
            stream: true,
            http: reqwest::Client::new(),
        }
    }

    /// Build a client from the loaded configuration.
    pub fn from_config(config: &DbChatConfig) -> Result<Self, ProviderError> {
        let client = Self::new(&config.ollama_url, &config.model, config.into())
            .with_keep_alive(&config.keep_alive)
            .with_stream(config.stream);
        match config.request_timeout_secs {
            Some(secs) => client.with_timeout(Duration::from_secs(secs)),
            None => Ok(client),
        }
    }

    pub fn with_keep_alive(mut self, keep_alive: &str) -> Self {
        self.keep_alive = keep_alive.to_string();
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Apply an overall per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ProviderError> {
        self.http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Names of the models the server has pulled.
    pub async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let tags: TagsResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    fn request<'a>(
        &'a self,
        messages: &'a [Message],
        tools: &'a [ToolDefinition],
    ) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: messages.iter().map(message_payload).collect(),
            tools: tools
                .iter()
                .map(|t| ToolPayload {
                    r#type: "function",
                    function: FunctionPayload {
                        name: &t.name,
                        description: &t.description,
                        parameters: &t.parameters,
                    },
                })
                .collect(),
            stream: self.stream,
            keep_alive: keep_alive_value(&self.keep_alive),
            options: &self.options,
        }
    }
}

#[async_trait]
impl ModelProvider for OllamaClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ModelReply, ProviderError> {
        let url = format!("{}/api/chat", self.base_url);
        let request = self.request(messages, tools);

        debug!(
            "Inference request to model {} ({} messages, stream={})",
            self.model,
            messages.len(),
            self.stream
        );

        let mut resp = self.http.post(&url).json(&request).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let mut builder = ReplyBuilder::default();
        if self.stream {
            let mut pending: Vec<u8> = Vec::new();
            while let Some(bytes) = resp.chunk().await? {
                pending.extend_from_slice(&bytes);
                while let Some(pos) = pending.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = pending.drain(..=pos).collect();
                    builder.absorb_line(&line)?;
                }
            }
            builder.absorb_line(&pending)?;
        } else {
            let body = resp.bytes().await?;
            builder.absorb_line(&body)?;
        }

        let reply = builder.finish()?;
        debug!(
            "Inference reply: {} chars, {} tool calls, {} tokens",
            reply.content.len(),
            reply.tool_calls.len(),
            reply.usage.total_tokens
        );
        Ok(reply)
    }
}
