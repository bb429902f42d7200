//! Error kinds surfaced by the library.
//!
//! Tool failures stop at the registry boundary and become text; everything
//! in [`AgentError`] is terminal for the current query.

use thiserror::Error;

/// Failure inside a single tool handler.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: &'static str, reason: String },

    #[error("table '{0}' does not exist")]
    UnknownTable(String),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("tool task failed: {0}")]
    Join(String),
}

/// Failure talking to the model provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request to model provider failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model provider reported an error: {0}")]
    Remote(String),

    #[error("failed to decode model provider response: {0}")]
    Decode(String),
}

/// Failure fetching background passages.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("passage store error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("passage store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("passage store lock poisoned")]
    Poisoned,
}

/// Terminal failure of one agent query.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("model requested unknown tool '{0}'")]
    UnknownTool(String),

    #[error("maximum number of iterations ({max_iterations}) reached")]
    IterationBudgetExceeded { max_iterations: usize },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Tool(ToolError),
}

impl From<ToolError> for AgentError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::UnknownTool(name) => Self::UnknownTool(name),
            other => Self::Tool(other),
        }
    }
}

impl AgentError {
    /// Message safe to show the end user: no SQL, no internals.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::IterationBudgetExceeded { .. } => {
                "Maximum number of iterations reached. Please try again with a different query."
            }
            _ => "Sorry, something went wrong while answering your question. Please try again.",
        }
    }
}
