pub mod args;
pub mod format;
pub mod kind;
pub mod schema;
pub mod sql;

pub use kind::ToolKind;

use crate::config::DbChatConfig;
use crate::error::ToolError;
use crate::logging::redact_sql;
use crate::state::{Access, AccessGate};
use crate::types::{ToolCall, ToolResult};
use args::{ReasoningArgs, SampleArgs, SqlArgs, TableArgs};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Definition of a tool exposed to the inference model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Tool definitions for the inference API
// ---------------------------------------------------------------------------

/// Build the list of tool definitions exposed to the inference model.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    ToolKind::ALL
        .into_iter()
        .map(|kind| ToolDefinition {
            name: kind.name().into(),
            description: kind.description().into(),
            parameters: kind.parameters(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tool execution engine
// ---------------------------------------------------------------------------

/// Knobs that change tool behaviour, fixed at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSettings {
    /// Commit statements run through `execute_sql`.
    pub allow_writes: bool,
    /// Count `...ID` columns as keys in `get_primary_keys`.
    pub infer_id_keys: bool,
    /// Row cap for `execute_sql` output.
    pub max_result_rows: usize,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            allow_writes: false,
            infer_id_keys: true,
            max_result_rows: 200,
        }
    }
}

impl From<&DbChatConfig> for ToolSettings {
    fn from(config: &DbChatConfig) -> Self {
        Self {
            allow_writes: config.allow_writes,
            infer_id_keys: config.infer_id_keys,
            max_result_rows: config.max_result_rows,
        }
    }
}

/// The fixed tool catalog bound to one database.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    gate: AccessGate,
    settings: ToolSettings,
    definitions: Vec<ToolDefinition>,
}

impl ToolRegistry {
    pub fn new(gate: AccessGate, settings: ToolSettings) -> Self {
        Self {
            gate,
            settings,
            definitions: tool_definitions(),
        }
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    /// Dispatch one tool call.
    ///
    /// Only an unregistered tool name is an error; every handler failure is
    /// turned into text on the returned [`ToolResult`].
    pub async fn call(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let kind = ToolKind::from_name(&call.name)
            .ok_or_else(|| ToolError::UnknownTool(call.name.clone()))?;

        let gate = self.gate.clone();
        let settings = self.settings.clone();
        let arguments = call.arguments.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            execute_tool(kind, &gate, &settings, &arguments)
        })
        .await
        .unwrap_or_else(|e| Err(ToolError::Join(e.to_string())));

        let (content, is_error) = match outcome {
            Ok(output) => {
                info!("Tool {} result: {} chars", kind, output.len());
                (output, false)
            }
            Err(e) => {
                warn!("Tool {} failed: {}", kind, redact_sql(&e.to_string()));
                (kind.failure_message(&e), true)
            }
        };

        Ok(ToolResult {
            call_id: call.call_id.clone(),
            name: kind.name().to_string(),
            content,
            is_error,
        })
    }
}

/// Run a tool synchronously with raw JSON arguments.
pub fn execute_tool(
    kind: ToolKind,
    gate: &AccessGate,
    settings: &ToolSettings,
    arguments: &serde_json::Value,
) -> Result<String, ToolError> {
    match kind {
        ToolKind::ListTables => {
            let a: ReasoningArgs = args::parse(kind, arguments)?;
            log_reasoning(kind, &a.reasoning);
            schema::list_tables(gate)
        }
        ToolKind::GetColumns => {
            let a: TableArgs = args::parse(kind, arguments)?;
            log_reasoning(kind, &a.reasoning);
            schema::get_columns(gate, &a.table_name)
        }
        ToolKind::CountRows => {
            let a: TableArgs = args::parse(kind, arguments)?;
            log_reasoning(kind, &a.reasoning);
            schema::count_rows(gate, &a.table_name)
        }
        ToolKind::DescribeTable => {
            let a: TableArgs = args::parse(kind, arguments)?;
            log_reasoning(kind, &a.reasoning);
            schema::describe_table(gate, &a.table_name)
        }
        ToolKind::SampleTable => {
            let a: SampleArgs = args::parse(kind, arguments)?;
            log_reasoning(kind, &a.reasoning);
            schema::sample_table(gate, &a.table_name, a.row_sample_size)
        }
        ToolKind::GetPrimaryKeys => {
            let a: TableArgs = args::parse(kind, arguments)?;
            log_reasoning(kind, &a.reasoning);
            schema::get_primary_keys(gate, &a.table_name, settings.infer_id_keys)
        }
        ToolKind::GetForeignKeys => {
            let a: TableArgs = args::parse(kind, arguments)?;
            log_reasoning(kind, &a.reasoning);
            schema::get_foreign_keys(gate, &a.table_name)
        }
        ToolKind::ExecuteSql => {
            let a: SqlArgs = args::parse(kind, arguments)?;
            log_reasoning(kind, &a.reasoning);
            let access = if settings.allow_writes {
                Access::ReadWrite
            } else {
                Access::ReadOnly
            };
            sql::execute_sql(gate, &a.sql_query, access, settings.max_result_rows)
        }
    }
}

fn log_reasoning(kind: ToolKind, reasoning: &str) {
    info!("Tool {}: {}", kind, redact_sql(reasoning));
}
