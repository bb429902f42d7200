//! The closed set of tools the model may call.

use crate::error::ToolError;
use serde_json::{json, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    ListTables,
    GetColumns,
    CountRows,
    DescribeTable,
    SampleTable,
    GetPrimaryKeys,
    GetForeignKeys,
    ExecuteSql,
}

impl ToolKind {
    /// Every tool, in the order they are offered to the model.
    pub const ALL: [ToolKind; 8] = [
        Self::ListTables,
        Self::GetColumns,
        Self::CountRows,
        Self::DescribeTable,
        Self::SampleTable,
        Self::GetPrimaryKeys,
        Self::GetForeignKeys,
        Self::ExecuteSql,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::ListTables => "list_tables",
            Self::GetColumns => "get_columns",
            Self::CountRows => "count_rows",
            Self::DescribeTable => "describe_table",
            Self::SampleTable => "sample_table",
            Self::GetPrimaryKeys => "get_primary_keys",
            Self::GetForeignKeys => "get_foreign_keys",
            Self::ExecuteSql => "execute_sql",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::ListTables => "List all user-created tables in the database.",
            Self::GetColumns => "Get comma-separated column names for a specific table.",
            Self::CountRows => "Count the number of rows in a table.",
            Self::DescribeTable => {
                "Describe a table's schema: one line per column with index, name, type, \
                 not-null flag, default value and primary-key position."
            }
            Self::SampleTable => {
                "Retrieve a sample of rows from a table as a markdown table with insights."
            }
            Self::GetPrimaryKeys => "Get the primary key columns of a table, comma-separated.",
            Self::GetForeignKeys => {
                "Get the foreign key constraints of a table, one per line as \
                 'from_col → to_table.to_col'."
            }
            Self::ExecuteSql => {
                "Execute a SQL query and return the results as a markdown table with \
                 insights. The query text is never shown to the user."
            }
        }
    }

    /// JSON Schema for the tool's parameters.
    pub fn parameters(self) -> Value {
        let reasoning = json!({
            "type": "string",
            "description": "Why this call is needed; explain your strategy."
        });
        let table_name = json!({
            "type": "string",
            "description": "Exact name of the table."
        });

        match self {
            Self::ListTables => json!({
                "type": "object",
                "properties": { "reasoning": reasoning },
                "required": []
            }),
            Self::GetColumns
            | Self::CountRows
            | Self::DescribeTable
            | Self::GetPrimaryKeys
            | Self::GetForeignKeys => json!({
                "type": "object",
                "properties": {
                    "table_name": table_name,
                    "reasoning": reasoning
                },
                "required": ["table_name"]
            }),
            Self::SampleTable => json!({
                "type": "object",
                "properties": {
                    "table_name": table_name,
                    "reasoning": reasoning,
                    "row_sample_size": {
                        "type": "integer",
                        "description": "Number of rows to retrieve (default 10)."
                    }
                },
                "required": ["table_name"]
            }),
            Self::ExecuteSql => json!({
                "type": "object",
                "properties": {
                    "sql_query": {
                        "type": "string",
                        "description": "The SQLite query to execute."
                    },
                    "reasoning": reasoning
                },
                "required": ["sql_query"]
            }),
        }
    }

    /// Text handed to the model when the handler failed.
    pub fn failure_message(self, err: &ToolError) -> String {
        match err {
            ToolError::InvalidArguments { .. } => return format!("Error: {}.", err),
            ToolError::UnknownTable(table) if self != Self::ExecuteSql => {
                return format!("Error: table '{}' does not exist.", table);
            }
            _ => {}
        }

        match self {
            Self::ListTables => "Error listing tables.",
            Self::GetColumns => "Error getting columns.",
            Self::CountRows => "Error counting rows.",
            Self::DescribeTable => "Error describing table.",
            Self::SampleTable => "Error sampling table.",
            Self::GetPrimaryKeys => "Error getting primary keys.",
            Self::GetForeignKeys => "Error getting foreign keys.",
            Self::ExecuteSql => {
                "An error occurred when executing the query. Please check your request."
            }
        }
        .to_string()
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ToolKind::from_name(" count_rows "), Some(ToolKind::CountRows));
        assert_eq!(ToolKind::from_name("drop_database"), None);
    }

    #[test]
    fn every_table_tool_requires_table_name() {
        for kind in ToolKind::ALL {
            let required = kind.parameters()["required"].clone();
            let needs_table = required
                .as_array()
                .unwrap()
                .iter()
                .any(|v| v == "table_name");
            let expected = !matches!(kind, ToolKind::ListTables | ToolKind::ExecuteSql);
            assert_eq!(needs_table, expected, "{}", kind);
        }
    }

    #[test]
    fn sql_failures_stay_opaque() {
        let err = ToolError::Sqlite(rusqlite::Error::InvalidQuery);
        let msg = ToolKind::ExecuteSql.failure_message(&err);
        assert!(msg.starts_with("An error occurred"));

        let unknown = ToolError::UnknownTable("Nope".into());
        assert_eq!(
            ToolKind::CountRows.failure_message(&unknown),
            "Error: table 'Nope' does not exist."
        );
    }
}
