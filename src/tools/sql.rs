//! Arbitrary SQL execution for the model.
//!
//! No restriction is placed on the query shape. Whether mutations persist is
//! decided by the scope's [`Access`].

use crate::error::ToolError;
use crate::state::{Access, AccessGate};
use crate::tools::format;
use rusqlite::Batch;

enum Outcome {
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
        total: usize,
        mutating: bool,
    },
    Statement {
        affected: usize,
    },
}

pub fn execute_sql(
    gate: &AccessGate,
    sql_query: &str,
    access: Access,
    max_rows: usize,
) -> Result<String, ToolError> {
    let sql = sql_query.trim().trim_end_matches(';').trim_end();
    if sql.is_empty() {
        return Err(ToolError::InvalidArguments {
            tool: "execute_sql",
            reason: "sql_query is empty".into(),
        });
    }

    let outcome = gate.acquire(access, |conn| {
        let mut batch = Batch::new(conn, sql);
        let mut stmt = batch.next()?.ok_or_else(|| ToolError::InvalidArguments {
            tool: "execute_sql",
            reason: "sql_query is empty".into(),
        })?;
        if batch.next()?.is_some() {
            return Err(ToolError::InvalidArguments {
                tool: "execute_sql",
                reason: "only one statement at a time".into(),
            });
        }

        let mutating = !stmt.readonly();
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        if columns.is_empty() {
            let affected = stmt.execute([])?;
            return Ok::<_, ToolError>(Outcome::Statement { affected });
        }

        let width = columns.len();
        let mut rows = Vec::new();
        let mut total = 0;
        let mut cursor = stmt.query([])?;
        while let Some(row) = cursor.next()? {
            total += 1;
            if rows.len() < max_rows {
                let mut cells = Vec::with_capacity(width);
                for i in 0..width {
                    cells.push(format::render_value(row.get_ref(i)?));
                }
                rows.push(cells);
            }
        }
        Ok(Outcome::Rows {
            columns,
            rows,
            total,
            mutating,
        })
    })?;

    Ok(match outcome {
        Outcome::Rows {
            columns,
            rows,
            total,
            mutating,
        } => {
            let mut out = render_rows(&columns, &rows, total);
            if mutating && access == Access::ReadOnly {
                out.push_str(
                    " These changes were not saved because the database is opened read-only.",
                );
            }
            out
        }
        Outcome::Statement { affected } => match access {
            Access::ReadWrite => format!(
                "Statement executed successfully; {} row(s) affected.",
                affected
            ),
            Access::ReadOnly => format!(
                "Statement executed; {} row(s) would be affected, but changes were not \
                 saved because the database is opened read-only.",
                affected
            ),
        },
    })
}

fn render_rows(columns: &[String], rows: &[Vec<String>], total: usize) -> String {
    let mut insight = format!("**Insight:** The query returned {} rows of data. ", total);
    if total == 0 {
        insight.push_str("No data was found for this request.");
    } else {
        insight.push_str(&format!(
            "The data shows information from column {} and related columns.",
            columns[0]
        ));
    }
    if rows.len() < total {
        insight.push_str(&format!(" Only the first {} rows are shown.", rows.len()));
    }
    format!("{}\n\n{}", format::markdown_table(columns, rows), insight)
}
