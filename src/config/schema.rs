//! Configuration schema for dbchat.toml.

use serde::{Deserialize, Serialize};

/// Root configuration structure. Fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbChatConfig {
    /// Model served by Ollama.
    pub model: String,

    /// Sampling temperature.
    pub temperature: f64,

    /// Context window size passed as `num_ctx`.
    pub context_window: u32,

    /// Seed for model sampling and the working-indicator picker.
    pub seed: u64,

    /// Ollama base URL.
    pub ollama_url: String,

    /// How long Ollama keeps the model loaded (`-1` = forever, or e.g. `5m`).
    pub keep_alive: String,

    /// Request streamed (NDJSON) responses from the provider.
    pub stream: bool,

    /// Optional HTTP timeout for provider requests, in seconds.
    pub request_timeout_secs: Option<u64>,

    /// Path to the SQLite database the agent answers questions about.
    pub db_path: String,

    /// Directory holding the passage store.
    pub vectors_dir: String,

    /// Number of background passages retrieved per query.
    pub retrieval_k: usize,

    /// Model round-trips allowed per query.
    pub max_iterations: usize,

    /// Prior messages sent to the model besides the system prompt (0 = all).
    pub history_window: usize,

    /// Commit statements run through `execute_sql`.
    pub allow_writes: bool,

    /// Treat columns whose names end in `ID` as keys.
    pub infer_id_keys: bool,

    /// Row cap for `execute_sql` result tables.
    pub max_result_rows: usize,

    /// Log level (debug, info, warn, error).
    pub log_level: String,
}

impl Default for DbChatConfig {
    fn default() -> Self {
        Self {
            model: "qwen3:1.7b".into(),
            temperature: 0.5,
            context_window: 4096,
            seed: 42,
            ollama_url: "http://127.0.0.1:11434".into(),
            keep_alive: "-1".into(),
            stream: true,
            request_timeout_secs: None,
            db_path: "~/.dbchat/northwind.db".into(),
            vectors_dir: "~/.dbchat/vector_store".into(),
            retrieval_k: 10,
            max_iterations: 20,
            history_window: 40,
            allow_writes: false,
            infer_id_keys: true,
            max_result_rows: 200,
            log_level: "info".into(),
        }
    }
}

impl DbChatConfig {
    /// Resolve a path that may contain `~` to an absolute path.
    pub fn resolve_path(&self, path: &str) -> String {
        shellexpand::tilde(path).into_owned()
    }

    /// Resolved database path.
    pub fn resolved_db_path(&self) -> String {
        self.resolve_path(&self.db_path)
    }

    /// Resolved passage store directory.
    pub fn resolved_vectors_dir(&self) -> String {
        self.resolve_path(&self.vectors_dir)
    }
}
