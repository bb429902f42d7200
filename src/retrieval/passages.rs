//! Full-text passage store backed by SQLite FTS5.

use crate::error::RetrievalError;
use crate::retrieval::{schema, ContextRetriever};
use crate::state::introspect;
use crate::state::{Access, AccessGate};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// File name of the store inside the vectors directory.
pub const STORE_FILE: &str = "passages.db";

/// Background passages the agent can draw on before answering.
pub struct PassageStore {
    conn: Mutex<Connection>,
}

impl PassageStore {
    /// Open (or create) the store in `dir` and run migrations.
    pub fn open(dir: &Path) -> Result<Self, RetrievalError> {
        std::fs::create_dir_all(dir)?;
        let conn = Connection::open(dir.join(STORE_FILE))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::with_connection(conn)
    }

    /// Open an in-memory store (for testing).
    pub fn open_memory() -> Result<Self, RetrievalError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, RetrievalError> {
        migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, RetrievalError> {
        self.conn.lock().map_err(|_| RetrievalError::Poisoned)
    }

    /// Add a single passage. Blank text is ignored.
    pub fn add(&self, source: &str, text: &str) -> Result<(), RetrievalError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        self.lock()?.execute(
            "INSERT INTO passages (source, content) VALUES (?1, ?2)",
            params![source, text],
        )?;
        Ok(())
    }

    /// Replace every passage from `source` with `passages`. Returns how many
    /// were stored.
    pub fn replace_source<S: AsRef<str>>(
        &self,
        source: &str,
        passages: &[S],
    ) -> Result<usize, RetrievalError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM passages WHERE source = ?1", params![source])?;
        let mut stored = 0;
        {
            let mut stmt = tx.prepare("INSERT INTO passages (source, content) VALUES (?1, ?2)")?;
            for passage in passages {
                let text = passage.as_ref().trim();
                if text.is_empty() {
                    continue;
                }
                stmt.execute(params![source, text])?;
                stored += 1;
            }
        }
        tx.commit()?;
        Ok(stored)
    }

    /// Index a text file, one passage per blank-line separated paragraph.
    /// Re-ingesting the same path replaces its earlier passages.
    pub fn ingest_file(&self, path: &Path) -> Result<usize, RetrievalError> {
        let text = std::fs::read_to_string(path)?;
        let stored = self.replace_source(&path.display().to_string(), &split_paragraphs(&text))?;
        info!("Ingested {} passages from {}", stored, path.display());
        Ok(stored)
    }

    /// Index one passage per table describing its columns and keys.
    pub fn ingest_schema(&self, gate: &AccessGate) -> Result<usize, RetrievalError> {
        let descriptions = gate.acquire(Access::ReadOnly, |conn| {
            let mut out = Vec::new();
            for table in introspect::list_tables(conn)? {
                out.push((table.clone(), describe_for_retrieval(conn, &table)?));
            }
            Ok::<_, RetrievalError>(out)
        })?;

        let mut stored = 0;
        for (table, text) in &descriptions {
            stored += self.replace_source(&format!("schema:{}", table), &[text])?;
        }
        info!("Ingested schema passages for {} tables", stored);
        Ok(stored)
    }

    pub fn count(&self) -> Result<usize, RetrievalError> {
        let n: i64 = self
            .lock()?
            .query_row("SELECT COUNT(*) FROM passages", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// Top `k` passages for `query`, best match first.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<String>, RetrievalError> {
        let fts_query = fts_query(query);
        if fts_query.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT p.content
             FROM passages_fts f
             JOIN passages p ON p.id = f.rowid
             WHERE passages_fts MATCH ?1
             ORDER BY bm25(passages_fts)
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![fts_query, k as i64], |row| row.get(0))?;
        let passages = rows.collect::<Result<Vec<String>, _>>()?;
        debug!("Retrieved {} passages", passages.len());
        Ok(passages)
    }
}

#[async_trait]
impl ContextRetriever for PassageStore {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>, RetrievalError> {
        self.search(query, k)
    }
}

fn migrate(conn: &Connection) -> Result<(), RetrievalError> {
    let version: u32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);

    if version == 0 {
        info!("Creating passage store schema v{}", schema::SCHEMA_VERSION);
        conn.execute_batch(schema::CREATE_SCHEMA)?;
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            params![schema::SCHEMA_VERSION],
        )?;
    }
    Ok(())
}

/// Quote every word so user text cannot inject FTS5 operators.
fn fts_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(|w| w.replace('"', ""))
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .map(|w| format!("\"{}\"", w))
        .collect::<Vec<_>>()
        .join(" OR ")
}

fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line.trim_end());
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    paragraphs
}

fn describe_for_retrieval(conn: &Connection, table: &str) -> rusqlite::Result<String> {
    let columns = introspect::table_info(conn, table)?;
    let keys = introspect::foreign_keys(conn, table)?;
    let rows = introspect::row_count(conn, table)?;

    let column_list: Vec<String> = columns
        .iter()
        .map(|c| {
            let mut desc = c.name.clone();
            if !c.decl_type.is_empty() {
                desc.push_str(&format!(" {}", c.decl_type));
            }
            if c.pk > 0 {
                desc.push_str(" primary key");
            }
            desc
        })
        .collect();

    let mut text = format!(
        "Table {} has {} rows. Columns: {}.",
        table,
        rows,
        column_list.join(", ")
    );
    if !keys.is_empty() {
        let refs: Vec<String> = keys
            .iter()
            .map(|fk| match &fk.to {
                Some(to) => format!("{} references {}.{}", fk.from, fk.table, to),
                None => format!("{} references {}", fk.from, fk.table),
            })
            .collect();
        text.push_str(&format!(" Foreign keys: {}.", refs.join(", ")));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fts_query_quotes_words() {
        assert_eq!(fts_query("how many \"customers\"?"), "\"how\" OR \"many\" OR \"customers?\"");
        assert_eq!(fts_query("  ?? "), "");
    }

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let parts = split_paragraphs("first line\nstill first\n\n\nsecond\n  \nthird");
        assert_eq!(parts, vec!["first line\nstill first", "second", "third"]);
    }

    #[test]
    fn search_ranks_matching_passages() {
        let store = PassageStore::open_memory().unwrap();
        store.add("notes", "Customers are stored in the Customers table.").unwrap();
        store.add("notes", "Freight costs live on Orders.").unwrap();
        store.add("notes", "   ").unwrap();
        assert_eq!(store.count().unwrap(), 2);

        let hits = store.search("customers", 5).unwrap();
        assert_eq!(hits, vec!["Customers are stored in the Customers table."]);
        assert!(store.search("", 5).unwrap().is_empty());
    }

    #[test]
    fn replacing_a_source_drops_old_passages() {
        let store = PassageStore::open_memory().unwrap();
        store.replace_source("a.md", &["alpha", "beta"]).unwrap();
        store.replace_source("a.md", &["gamma"]).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert!(store.search("alpha", 5).unwrap().is_empty());
        assert_eq!(store.search("gamma", 5).unwrap(), vec!["gamma"]);
    }

    #[test]
    fn reopening_keeps_passages() {
        let dir = tempfile::tempdir().unwrap();
        PassageStore::open(dir.path())
            .unwrap()
            .add("notes", "shippers deliver orders")
            .unwrap();
        let store = PassageStore::open(dir.path()).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn schema_passages_describe_tables() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("shop.db");
        Connection::open(&db)
            .unwrap()
            .execute_batch(
                "CREATE TABLE Customers (CustomerID TEXT PRIMARY KEY, Name TEXT);
                 CREATE TABLE Orders (OrderID INTEGER PRIMARY KEY,
                     CustomerID TEXT REFERENCES Customers(CustomerID));
                 INSERT INTO Customers VALUES ('ALFKI', 'Alfreds');",
            )
            .unwrap();

        let store = PassageStore::open_memory().unwrap();
        assert_eq!(store.ingest_schema(&AccessGate::new(&db)).unwrap(), 2);
        assert_eq!(store.ingest_schema(&AccessGate::new(&db)).unwrap(), 2);
        assert_eq!(store.count().unwrap(), 2);

        let hits = store.search("Orders", 1).unwrap();
        assert!(hits[0].contains("CustomerID references Customers.CustomerID"));
    }
}
