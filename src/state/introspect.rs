//! Catalog queries over an open connection.
//!
//! Identifiers are interpolated only through [`quote_ident`]; everything else
//! is bound as a parameter.

use rusqlite::{params, Connection, OptionalExtension};

/// Quote an identifier for SQLite, doubling embedded `"` characters.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// One row of `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub cid: i64,
    pub name: String,
    pub decl_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    /// 1-based position in the primary key, 0 when not part of it.
    pub pk: i64,
}

/// One row of `PRAGMA foreign_key_list`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub from: String,
    pub table: String,
    /// `None` when the constraint targets the parent's primary key implicitly.
    pub to: Option<String>,
}

/// User tables, excluding SQLite's internal `sqlite_%` tables.
pub fn list_tables(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
    )?;
    let rows = stmt.query_map([], |row| row.get(0))?;
    rows.collect()
}

/// Canonical name of a table or view, matched case-insensitively as SQLite does.
pub fn resolve_table(conn: &Connection, name: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT name FROM sqlite_master
         WHERE type IN ('table', 'view') AND name = ?1 COLLATE NOCASE
         LIMIT 1",
        params![name],
        |row| row.get(0),
    )
    .optional()
}

pub fn table_info(conn: &Connection, table: &str) -> rusqlite::Result<Vec<ColumnInfo>> {
    let sql = format!("PRAGMA table_info({})", quote_ident(table));
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok(ColumnInfo {
            cid: row.get(0)?,
            name: row.get(1)?,
            decl_type: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            not_null: row.get::<_, i64>(3)? != 0,
            default_value: row.get(4)?,
            pk: row.get(5)?,
        })
    })?;
    rows.collect()
}

pub fn foreign_keys(conn: &Connection, table: &str) -> rusqlite::Result<Vec<ForeignKey>> {
    let sql = format!("PRAGMA foreign_key_list({})", quote_ident(table));
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok(ForeignKey {
            table: row.get(2)?,
            from: row.get(3)?,
            to: row.get(4)?,
        })
    })?;
    rows.collect()
}

pub fn row_count(conn: &Connection, table: &str) -> rusqlite::Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
    conn.query_row(&sql, [], |row| row.get(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE Customers (CustomerID INTEGER PRIMARY KEY, Name TEXT NOT NULL DEFAULT 'x');
            CREATE TABLE Orders (
                OrderID INTEGER PRIMARY KEY,
                CustomerID INTEGER REFERENCES Customers(CustomerID),
                Note
            );
            CREATE VIEW recent AS SELECT * FROM Orders;
            INSERT INTO Customers (Name) VALUES ('a'), ('b');
            "#,
        )
        .unwrap();
        conn
    }

    #[test]
    fn quote_ident_doubles_quotes() {
        assert_eq!(quote_ident("plain"), "\"plain\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn lists_user_tables_only() {
        let conn = conn();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT)")
            .unwrap();
        let tables = list_tables(&conn).unwrap();
        assert_eq!(tables, vec!["Customers", "Orders", "t"]);
    }

    #[test]
    fn resolves_tables_and_views_case_insensitively() {
        let conn = conn();
        assert_eq!(resolve_table(&conn, "customers").unwrap().as_deref(), Some("Customers"));
        assert_eq!(resolve_table(&conn, "recent").unwrap().as_deref(), Some("recent"));
        assert_eq!(resolve_table(&conn, "nope").unwrap(), None);
    }

    #[test]
    fn table_info_reads_constraints() {
        let conn = conn();
        let cols = table_info(&conn, "Customers").unwrap();
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[0].pk, 1);
        assert!(cols[1].not_null);
        assert_eq!(cols[1].default_value.as_deref(), Some("'x'"));

        let orders = table_info(&conn, "Orders").unwrap();
        assert_eq!(orders[2].decl_type, "");
    }

    #[test]
    fn foreign_keys_list_targets() {
        let conn = conn();
        let fks = foreign_keys(&conn, "Orders").unwrap();
        assert_eq!(
            fks,
            vec![ForeignKey {
                from: "CustomerID".into(),
                table: "Customers".into(),
                to: Some("CustomerID".into()),
            }]
        );
    }

    #[test]
    fn row_count_counts() {
        assert_eq!(row_count(&conn(), "Customers").unwrap(), 2);
    }
}
