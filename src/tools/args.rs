//! Typed tool arguments, deserialized from the model's JSON.

use crate::error::ToolError;
use crate::tools::ToolKind;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub const DEFAULT_SAMPLE_SIZE: usize = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct ReasoningArgs {
    #[serde(default)]
    pub reasoning: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableArgs {
    pub table_name: String,
    #[serde(default)]
    pub reasoning: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SampleArgs {
    pub table_name: String,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default = "default_sample_size", deserialize_with = "lenient_usize")]
    pub row_sample_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SqlArgs {
    #[serde(alias = "query", alias = "sql")]
    pub sql_query: String,
    #[serde(default)]
    pub reasoning: String,
}

fn default_sample_size() -> usize {
    DEFAULT_SAMPLE_SIZE
}

/// Small models often send numbers as strings; accept both.
fn lenient_usize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let parsed = match &value {
        Value::Null => Some(DEFAULT_SAMPLE_SIZE),
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .map(|n| n as usize),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| D::Error::custom(format!("expected a non-negative integer, got {}", value)))
}

/// Deserialize `args` for `kind`. A null payload counts as `{}`.
pub fn parse<T: DeserializeOwned>(kind: ToolKind, args: &Value) -> Result<T, ToolError> {
    let payload = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args.clone()
    };
    serde_json::from_value(payload).map_err(|e| ToolError::InvalidArguments {
        tool: kind.name(),
        reason: e.to_string(),
    })
}
