//! Summary of the configured database for status displays.

use crate::state::gate::{Access, AccessGate};
use crate::state::introspect;
use std::path::PathBuf;

/// A table and how many rows it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    pub name: String,
    pub rows: i64,
}

/// File path, size and per-table row counts.
#[derive(Debug, Clone)]
pub struct DatabaseOverview {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub tables: Vec<TableSummary>,
}

impl DatabaseOverview {
    pub fn load(gate: &AccessGate) -> anyhow::Result<Self> {
        let size_bytes = std::fs::metadata(gate.path())?.len();
        let tables = gate.acquire(Access::ReadOnly, |conn| {
            introspect::list_tables(conn)?
                .into_iter()
                .map(|name| {
                    let rows = introspect::row_count(conn, &name)?;
                    Ok(TableSummary { name, rows })
                })
                .collect::<rusqlite::Result<Vec<_>>>()
        })?;

        Ok(Self {
            path: gate.path().to_path_buf(),
            size_bytes,
            tables,
        })
    }

    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}
