//! Passage store schema definitions.

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Full DDL for the passage store.
pub const CREATE_SCHEMA: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

-- Background passages, grouped by where they came from
CREATE TABLE IF NOT EXISTS passages (
    id         INTEGER PRIMARY KEY,
    source     TEXT NOT NULL,
    content    TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_passages_source ON passages(source);

-- Full-text index over passage content, ranked with bm25
CREATE VIRTUAL TABLE IF NOT EXISTS passages_fts USING fts5(
    content,
    content='passages',
    content_rowid='id'
);

CREATE TRIGGER IF NOT EXISTS passages_ai AFTER INSERT ON passages BEGIN
    INSERT INTO passages_fts(rowid, content) VALUES (new.id, new.content);
END;

CREATE TRIGGER IF NOT EXISTS passages_ad AFTER DELETE ON passages BEGIN
    INSERT INTO passages_fts(passages_fts, rowid, content)
    VALUES ('delete', old.id, old.content);
END;
"#;
