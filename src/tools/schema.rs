//! Schema-inspection tools. All of them run in read-only scopes.

use crate::error::ToolError;
use crate::state::introspect::{self, quote_ident};
use crate::state::{Access, AccessGate};
use crate::tools::format;
use rusqlite::{params, Connection};

/// Canonical table name, or [`ToolError::UnknownTable`].
fn existing_table(conn: &Connection, table_name: &str) -> Result<String, ToolError> {
    introspect::resolve_table(conn, table_name)?
        .ok_or_else(|| ToolError::UnknownTable(table_name.to_string()))
}

pub fn list_tables(gate: &AccessGate) -> Result<String, ToolError> {
    let tables = gate.acquire(Access::ReadOnly, introspect::list_tables)?;
    Ok(format!(
        "**Tables:**\n{}\n\n**Insight:** The database contains {} accessible tables.",
        format::bullet_list(&tables),
        tables.len()
    ))
}

pub fn get_columns(gate: &AccessGate, table_name: &str) -> Result<String, ToolError> {
    gate.acquire(Access::ReadOnly, |conn| {
        let table = existing_table(conn, table_name)?;
        let columns = introspect::table_info(conn, &table)?;
        Ok(columns
            .into_iter()
            .map(|c| c.name)
            .collect::<Vec<_>>()
            .join(", "))
    })
}

pub fn count_rows(gate: &AccessGate, table_name: &str) -> Result<String, ToolError> {
    gate.acquire(Access::ReadOnly, |conn| {
        let table = existing_table(conn, table_name)?;
        Ok(introspect::row_count(conn, &table)?.to_string())
    })
}

pub fn describe_table(gate: &AccessGate, table_name: &str) -> Result<String, ToolError> {
    gate.acquire(Access::ReadOnly, |conn| {
        let table = existing_table(conn, table_name)?;
        let lines: Vec<String> = introspect::table_info(conn, &table)?
            .into_iter()
            .map(|c| {
                format!(
                    "({}, {}, {}, {}, {}, {})",
                    c.cid,
                    c.name,
                    c.decl_type,
                    u8::from(c.not_null),
                    c.default_value.as_deref().unwrap_or("NULL"),
                    c.pk
                )
            })
            .collect();
        Ok(lines.join("\n"))
    })
}

pub fn sample_table(
    gate: &AccessGate,
    table_name: &str,
    row_sample_size: usize,
) -> Result<String, ToolError> {
    let limit = row_sample_size.min(1000) as i64;
    let (table, columns, rows) = gate.acquire(Access::ReadOnly, |conn| {
        let table = existing_table(conn, table_name)?;
        let sql = format!("SELECT * FROM {} LIMIT ?1", quote_ident(&table));
        let mut stmt = conn.prepare(&sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.query(params![limit])?;
        while let Some(row) = cursor.next()? {
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
                cells.push(format::render_value(row.get_ref(i)?));
            }
            rows.push(cells);
        }
        Ok::<_, ToolError>((table, columns, rows))
    })?;

    Ok(format!(
        "{}\n\n**Insight:** Showing {} sample rows from table {}. \
         This data gives a first impression of the table's contents.",
        format::markdown_table(&columns, &rows),
        rows.len(),
        table
    ))
}

/// Schema-declared key columns, plus `...ID` columns when `infer_id_keys` is set.
pub fn get_primary_keys(
    gate: &AccessGate,
    table_name: &str,
    infer_id_keys: bool,
) -> Result<String, ToolError> {
    gate.acquire(Access::ReadOnly, |conn| {
        let table = existing_table(conn, table_name)?;
        let keys: Vec<String> = introspect::table_info(conn, &table)?
            .into_iter()
            .filter(|c| c.pk > 0 || (infer_id_keys && c.name.ends_with("ID")))
            .map(|c| c.name)
            .collect();
        Ok(keys.join(", "))
    })
}

pub fn get_foreign_keys(gate: &AccessGate, table_name: &str) -> Result<String, ToolError> {
    gate.acquire(Access::ReadOnly, |conn| {
        let table = existing_table(conn, table_name)?;
        let lines: Vec<String> = introspect::foreign_keys(conn, &table)?
            .into_iter()
            .map(|fk| match fk.to {
                Some(to) => format!("{} → {}.{}", fk.from, fk.table, to),
                None => format!("{} → {}", fk.from, fk.table),
            })
            .collect();
        Ok(lines.join("\n"))
    })
}
