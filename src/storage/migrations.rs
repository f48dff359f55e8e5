//! Database migrations for the document store

use rusqlite::Connection;

use crate::error::Result;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Run all migrations
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    let current_version = schema_version(conn)?;

    if current_version < SCHEMA_VERSION {
        migrate_v1(conn)?;
    }

    Ok(())
}

/// Highest applied schema version, 0 for a fresh database
pub fn schema_version(conn: &Connection) -> Result<i32> {
    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Initial schema (v1)
///
/// Each entity is stored as one JSON document in `doc`; the other columns are
/// projections used for filtering, ordering and the full-text index, and are
/// rewritten together with the document on every write.
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS memories (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            memory_type TEXT NOT NULL,
            category TEXT NOT NULL,
            content TEXT NOT NULL,
            title TEXT,
            description TEXT,
            tags TEXT NOT NULL DEFAULT '',
            context_id TEXT,
            importance INTEGER NOT NULL DEFAULT 3,
            access_count INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            doc TEXT NOT NULL
        );

        -- One row per (memory, tag) for tag filters and statistics
        CREATE TABLE IF NOT EXISTS memory_tags (
            memory_id TEXT NOT NULL,
            tag TEXT NOT NULL,
            PRIMARY KEY (memory_id, tag),
            FOREIGN KEY (memory_id) REFERENCES memories(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS contexts (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            context_type TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            doc TEXT NOT NULL
        );

        -- Lexical index over the searchable fields
        CREATE VIRTUAL TABLE IF NOT EXISTS memories_fts USING fts5(
            content,
            title,
            description,
            tags,
            content='memories',
            content_rowid='seq',
            tokenize='unicode61'
        );

        CREATE TRIGGER IF NOT EXISTS memories_ai AFTER INSERT ON memories BEGIN
            INSERT INTO memories_fts(rowid, content, title, description, tags)
            VALUES (NEW.seq, NEW.content, NEW.title, NEW.description, NEW.tags);
        END;

        CREATE TRIGGER IF NOT EXISTS memories_ad AFTER DELETE ON memories BEGIN
            INSERT INTO memories_fts(memories_fts, rowid, content, title, description, tags)
            VALUES ('delete', OLD.seq, OLD.content, OLD.title, OLD.description, OLD.tags);
        END;

        CREATE TRIGGER IF NOT EXISTS memories_au
        AFTER UPDATE OF content, title, description, tags ON memories BEGIN
            INSERT INTO memories_fts(memories_fts, rowid, content, title, description, tags)
            VALUES ('delete', OLD.seq, OLD.content, OLD.title, OLD.description, OLD.tags);
            INSERT INTO memories_fts(rowid, content, title, description, tags)
            VALUES (NEW.seq, NEW.content, NEW.title, NEW.description, NEW.tags);
        END;

        CREATE INDEX IF NOT EXISTS idx_memories_created ON memories(created_at DESC, seq DESC);
        CREATE INDEX IF NOT EXISTS idx_memories_type ON memories(memory_type);
        CREATE INDEX IF NOT EXISTS idx_memories_category ON memories(category);
        CREATE INDEX IF NOT EXISTS idx_memories_context ON memories(context_id);
        CREATE INDEX IF NOT EXISTS idx_memory_tags_tag ON memory_tags(tag);
        CREATE INDEX IF NOT EXISTS idx_contexts_active ON contexts(active);

        INSERT INTO schema_version (version) VALUES (1);
        "#,
    )?;

    Ok(())
}
