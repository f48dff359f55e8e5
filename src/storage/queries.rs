//! Database queries for the document store
//!
//! Free functions over a `&Connection` so they compose inside
//! `Storage::with_transaction`. The `doc` column is the source of truth;
//! the other columns are projections rewritten on every write.

use std::collections::BTreeMap;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{EntityKind, HubError, Result};
use crate::query::aggregation::{HubStats, TagCount, TOP_TAGS};
use crate::types::*;

static FTS_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{L}\p{N}_]+").unwrap());

fn doc_from_row<T: serde::de::DeserializeOwned>(row: &Row) -> rusqlite::Result<T> {
    let doc: String = row.get("doc")?;
    serde_json::from_str(&doc)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
}

/// Parse a memory from a row carrying a `doc` column
pub fn memory_from_row(row: &Row) -> rusqlite::Result<Memory> {
    doc_from_row(row)
}

/// Parse a context from a row carrying a `doc` column
pub fn context_from_row(row: &Row) -> rusqlite::Result<Context> {
    doc_from_row(row)
}

/// Build an FTS5 query that ORs every word of `query` as a quoted term.
/// Returns `None` when the query has no indexable words.
pub fn fts_query(query: &str) -> Option<String> {
    let terms: Vec<String> = FTS_TOKEN
        .find_iter(query)
        .map(|m| format!("\"{}\"", m.as_str()))
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}

// ============================================================================
// Memories
// ============================================================================

fn replace_tags(conn: &Connection, memory: &Memory) -> Result<()> {
    conn.execute(
        "DELETE FROM memory_tags WHERE memory_id = ?",
        params![memory.id],
    )?;
    let mut stmt = conn.prepare("INSERT OR IGNORE INTO memory_tags (memory_id, tag) VALUES (?, ?)")?;
    for tag in &memory.metadata.tags {
        stmt.execute(params![memory.id, tag])?;
    }
    Ok(())
}

fn memory_exists(conn: &Connection, id: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT seq FROM memories WHERE id = ?", params![id], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(found.is_some())
}

/// Insert a new memory document
pub fn create_memory(conn: &Connection, memory: &Memory) -> Result<()> {
    if memory_exists(conn, &memory.id)? {
        return Err(HubError::DuplicateKey {
            kind: EntityKind::Memory,
            id: memory.id.clone(),
        });
    }

    let doc = serde_json::to_string(memory)?;
    conn.execute(
        "INSERT INTO memories (id, memory_type, category, content, title, description, tags,
                               context_id, importance, access_count, created_at, updated_at, doc)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            memory.id,
            memory.memory_type.as_str(),
            memory.category.as_str(),
            memory.content,
            memory.metadata.title,
            memory.metadata.description,
            memory.metadata.tags.join(" "),
            memory.relations.context_id,
            memory.metadata.importance,
            memory.metadata.access_count as i64,
            memory.metadata.created_at.timestamp_micros(),
            memory.metadata.updated_at.timestamp_micros(),
            doc,
        ],
    )?;
    replace_tags(conn, memory)?;
    Ok(())
}

/// Rewrite an existing memory document and its projections
pub fn write_memory(conn: &Connection, memory: &Memory) -> Result<()> {
    let doc = serde_json::to_string(memory)?;
    let changed = conn.execute(
        "UPDATE memories SET memory_type = ?, category = ?, content = ?, title = ?,
                description = ?, tags = ?, context_id = ?, importance = ?,
                access_count = ?, updated_at = ?, doc = ?
         WHERE id = ?",
        params![
            memory.memory_type.as_str(),
            memory.category.as_str(),
            memory.content,
            memory.metadata.title,
            memory.metadata.description,
            memory.metadata.tags.join(" "),
            memory.relations.context_id,
            memory.metadata.importance,
            memory.metadata.access_count as i64,
            memory.metadata.updated_at.timestamp_micros(),
            doc,
            memory.id,
        ],
    )?;
    if changed == 0 {
        return Err(HubError::memory_not_found(&memory.id));
    }
    replace_tags(conn, memory)?;
    Ok(())
}

/// Read a memory without recording the access
pub fn get_memory(conn: &Connection, id: &str) -> Result<Option<Memory>> {
    let memory = conn
        .query_row(
            "SELECT doc FROM memories WHERE id = ?",
            params![id],
            memory_from_row,
        )
        .optional()?;
    Ok(memory)
}

/// Read a memory and record the access
pub fn touch_memory(conn: &Connection, id: &str) -> Result<Option<Memory>> {
    let Some(mut memory) = get_memory(conn, id)? else {
        return Ok(None);
    };
    memory.touch(Utc::now());
    write_memory(conn, &memory)?;
    Ok(Some(memory))
}

/// Merge a patch into a stored memory
pub fn update_memory(conn: &Connection, id: &str, patch: MemoryPatch) -> Result<Memory> {
    let mut memory = get_memory(conn, id)?.ok_or_else(|| HubError::memory_not_found(id))?;
    memory.apply_patch(patch, Utc::now())?;
    memory.validate()?;
    write_memory(conn, &memory)?;
    Ok(memory)
}

pub fn delete_memory(conn: &Connection, id: &str) -> Result<bool> {
    conn.execute("DELETE FROM memory_tags WHERE memory_id = ?", params![id])?;
    let removed = conn.execute("DELETE FROM memories WHERE id = ?", params![id])?;
    Ok(removed > 0)
}

/// List memories matching a filter, newest first
pub fn list_memories(conn: &Connection, filter: &MemoryFilter) -> Result<Vec<Memory>> {
    let mut sql = String::from("SELECT m.doc FROM memories m");
    let mut conditions: Vec<String> = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(memory_type) = filter.memory_type {
        conditions.push("m.memory_type = ?".to_string());
        params.push(Box::new(memory_type.as_str()));
    }

    if let Some(category) = filter.category {
        conditions.push("m.category = ?".to_string());
        params.push(Box::new(category.as_str()));
    }

    // ANY of the tags
    if let Some(ref tags) = filter.tags {
        if !tags.is_empty() {
            let placeholders: Vec<&str> = tags.iter().map(|_| "?").collect();
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM memory_tags mt WHERE mt.memory_id = m.id AND mt.tag IN ({}))",
                placeholders.join(", ")
            ));
            for tag in tags {
                params.push(Box::new(tag.clone()));
            }
        }
    }

    if let Some(ref context_id) = filter.context_id {
        conditions.push("m.context_id = ?".to_string());
        params.push(Box::new(context_id.clone()));
    }

    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(" ORDER BY m.created_at DESC, m.seq DESC");

    let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|b| b.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let memories = stmt
        .query_map(param_refs.as_slice(), memory_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(memories)
}

/// Case-insensitive substring search, ranked by BM25 where the index matches
pub fn search_memories(conn: &Connection, query: &str, limit: usize) -> Result<Vec<Memory>> {
    const MATCHES: &str = "hub_contains(m.content, :needle)
           OR hub_contains(m.title, :needle)
           OR hub_contains(m.description, :needle)
           OR EXISTS (SELECT 1 FROM memory_tags mt
                      WHERE mt.memory_id = m.id AND hub_contains(mt.tag, :needle))";

    let limit = limit as i64;
    let memories = match fts_query(query) {
        Some(fts) => {
            let sql = format!(
                "SELECT m.doc FROM memories m
                 LEFT JOIN (SELECT rowid, bm25(memories_fts) AS score
                            FROM memories_fts WHERE memories_fts MATCH :fts) f
                        ON f.rowid = m.seq
                 WHERE {}
                 ORDER BY f.score IS NULL, f.score, m.created_at DESC, m.seq DESC
                 LIMIT :limit",
                MATCHES
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(
                rusqlite::named_params! { ":fts": fts, ":needle": query, ":limit": limit },
                memory_from_row,
            )?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        }
        None => {
            let sql = format!(
                "SELECT m.doc FROM memories m
                 WHERE {}
                 ORDER BY m.created_at DESC, m.seq DESC
                 LIMIT :limit",
                MATCHES
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(
                rusqlite::named_params! { ":needle": query, ":limit": limit },
                memory_from_row,
            )?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        }
    };

    Ok(memories)
}

pub fn count_memories(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0))?;
    Ok(count as usize)
}

// ============================================================================
// Contexts
// ============================================================================

pub fn create_context(conn: &Connection, context: &Context) -> Result<()> {
    if get_context(conn, &context.id)?.is_some() {
        return Err(HubError::DuplicateKey {
            kind: EntityKind::Context,
            id: context.id.clone(),
        });
    }

    let doc = serde_json::to_string(context)?;
    conn.execute(
        "INSERT INTO contexts (id, context_type, active, created_at, doc) VALUES (?, ?, ?, ?, ?)",
        params![
            context.id,
            context.context_type.as_str(),
            context.metadata.active,
            context.metadata.created_at.timestamp_micros(),
            doc,
        ],
    )?;
    Ok(())
}

pub fn write_context(conn: &Connection, context: &Context) -> Result<()> {
    let doc = serde_json::to_string(context)?;
    let changed = conn.execute(
        "UPDATE contexts SET context_type = ?, active = ?, doc = ? WHERE id = ?",
        params![
            context.context_type.as_str(),
            context.metadata.active,
            doc,
            context.id,
        ],
    )?;
    if changed == 0 {
        return Err(HubError::context_not_found(&context.id));
    }
    Ok(())
}

pub fn get_context(conn: &Connection, id: &str) -> Result<Option<Context>> {
    let context = conn
        .query_row(
            "SELECT doc FROM contexts WHERE id = ?",
            params![id],
            context_from_row,
        )
        .optional()?;
    Ok(context)
}

pub fn update_context(conn: &Connection, id: &str, patch: ContextPatch) -> Result<Context> {
    let mut context = get_context(conn, id)?.ok_or_else(|| HubError::context_not_found(id))?;
    context.apply_patch(patch, Utc::now());
    context.validate()?;
    write_context(conn, &context)?;
    Ok(context)
}

pub fn delete_context(conn: &Connection, id: &str) -> Result<bool> {
    let removed = conn.execute("DELETE FROM contexts WHERE id = ?", params![id])?;
    Ok(removed > 0)
}

/// List contexts matching a filter, oldest first
pub fn list_contexts(conn: &Connection, filter: &ContextFilter) -> Result<Vec<Context>> {
    let mut sql = String::from("SELECT doc FROM contexts");
    let mut conditions: Vec<&str> = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(context_type) = filter.context_type {
        conditions.push("context_type = ?");
        params.push(Box::new(context_type.as_str()));
    }
    if let Some(active) = filter.active {
        conditions.push("active = ?");
        params.push(Box::new(active));
    }

    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(" ORDER BY created_at ASC, seq ASC");

    let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|b| b.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let contexts = stmt
        .query_map(param_refs.as_slice(), context_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(contexts)
}

pub fn count_contexts(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM contexts", [], |row| row.get(0))?;
    Ok(count as usize)
}

// ============================================================================
// Relations
// ============================================================================

/// Point `memory_id` at `context_id` and update both member lists.
/// Expected to run inside a transaction.
pub fn link_memory_to_context(conn: &Connection, memory_id: &str, context_id: &str) -> Result<()> {
    let mut context =
        get_context(conn, context_id)?.ok_or_else(|| HubError::context_not_found(context_id))?;
    let mut memory =
        get_memory(conn, memory_id)?.ok_or_else(|| HubError::memory_not_found(memory_id))?;
    let now = Utc::now();

    let previous = memory.relations.context_id.replace(context_id.to_string());
    memory.metadata.updated_at = now;
    write_memory(conn, &memory)?;

    if let Some(previous) = previous.filter(|p| p != context_id) {
        if let Some(mut old) = get_context(conn, &previous)? {
            if old.remove_member(memory_id) {
                old.metadata.updated_at = now;
                write_context(conn, &old)?;
            }
        }
    }

    context.add_member(memory_id);
    context.metadata.updated_at = now;
    write_context(conn, &context)
}

/// Clear the active flag on every context. Returns how many were changed.
pub fn deactivate_all(conn: &Connection) -> Result<usize> {
    let active = list_contexts(
        conn,
        &ContextFilter {
            active: Some(true),
            ..Default::default()
        },
    )?;
    let now = Utc::now();
    for mut context in active.iter().cloned() {
        context.metadata.active = false;
        context.metadata.updated_at = now;
        write_context(conn, &context)?;
    }
    Ok(active.len())
}

/// Set the active flag on one context, `None` if it does not exist
pub fn mark_active(conn: &Connection, id: &str) -> Result<Option<Context>> {
    let Some(mut context) = get_context(conn, id)? else {
        return Ok(None);
    };
    context.metadata.active = true;
    context.metadata.updated_at = Utc::now();
    write_context(conn, &context)?;
    Ok(Some(context))
}

// ============================================================================
// Statistics
// ============================================================================

fn grouped_counts<K: Ord>(
    conn: &Connection,
    sql: &str,
    parse: impl Fn(&str) -> std::result::Result<K, String>,
) -> Result<BTreeMap<K, usize>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut counts = BTreeMap::new();
    for row in rows {
        let (key, count) = row?;
        let key = parse(&key).map_err(HubError::Internal)?;
        counts.insert(key, count as usize);
    }
    Ok(counts)
}

/// Aggregate statistics computed in SQL
pub fn get_stats(conn: &Connection) -> Result<HubStats> {
    let by_category = grouped_counts(
        conn,
        "SELECT category, COUNT(*) FROM memories GROUP BY category",
        |s| s.parse::<DataCategory>(),
    )?;
    let by_type = grouped_counts(
        conn,
        "SELECT memory_type, COUNT(*) FROM memories GROUP BY memory_type",
        |s| s.parse::<MemoryType>(),
    )?;

    let mut stmt = conn.prepare(
        "SELECT tag, COUNT(*) AS cnt FROM memory_tags
         GROUP BY tag ORDER BY cnt DESC, tag ASC LIMIT ?",
    )?;
    let top_tags = stmt
        .query_map(params![TOP_TAGS as i64], |row| {
            Ok(TagCount {
                tag: row.get(0)?,
                count: row.get::<_, i64>(1)? as usize,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(HubStats {
        total_memories: count_memories(conn)?,
        total_contexts: count_contexts(conn)?,
        by_category,
        by_type,
        top_tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;
    use chrono::Duration;

    fn storage() -> Storage {
        Storage::open_in_memory().unwrap()
    }

    fn memory(id: &str, content: &str, tags: &[&str]) -> Memory {
        let mut memory = Memory::new(id, content, Utc::now());
        memory.metadata.tags = tags.iter().map(|t| t.to_string()).collect();
        memory
    }

    #[test]
    fn test_fts_query_quotes_terms() {
        assert_eq!(fts_query("dark mode"), Some("\"dark\" OR \"mode\"".to_string()));
        assert_eq!(fts_query("c++ \"quoted\""), Some("\"c\" OR \"quoted\"".to_string()));
        assert_eq!(fts_query("*** --"), None);
    }

    #[test]
    fn test_document_round_trip() {
        let storage = storage();
        let mut original = memory("mem_1", "Prefers tabs", &["style"]);
        original.metadata.title = Some("Indentation".to_string());
        storage.with_connection(|conn| create_memory(conn, &original)).unwrap();

        let loaded = storage
            .with_connection(|conn| get_memory(conn, "mem_1"))
            .unwrap()
            .unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let storage = storage();
        let m = memory("mem_1", "x", &[]);
        storage.with_connection(|conn| create_memory(conn, &m)).unwrap();
        let err = storage
            .with_connection(|conn| create_memory(conn, &m))
            .unwrap_err();
        assert!(matches!(err, HubError::DuplicateKey { .. }));
    }

    #[test]
    fn test_search_ranks_indexed_hits_before_substring_hits() {
        let storage = storage();
        let now = Utc::now();
        // "script" only occurs inside a longer word here, so FTS does not match it
        let mut substring = memory("mem_sub", "TypeScript generics", &[]);
        substring.metadata.created_at = now;
        let mut token = memory("mem_tok", "a shell script", &[]);
        token.metadata.created_at = now - Duration::days(1);

        storage
            .with_connection(|conn| {
                create_memory(conn, &substring)?;
                create_memory(conn, &token)
            })
            .unwrap();

        let hits = storage
            .with_connection(|conn| search_memories(conn, "script", 100))
            .unwrap();
        let ids: Vec<&str> = hits.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["mem_tok", "mem_sub"]);
    }

    #[test]
    fn test_search_respects_limit_and_punctuation_only_queries() {
        let storage = storage();
        storage
            .with_connection(|conn| {
                for i in 0..5 {
                    create_memory(conn, &memory(&format!("mem_{}", i), "uses c++ daily", &[]))?;
                }
                Ok(())
            })
            .unwrap();

        let hits = storage
            .with_connection(|conn| search_memories(conn, "++", 3))
            .unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn test_update_rewrites_projections() {
        let storage = storage();
        storage
            .with_connection(|conn| create_memory(conn, &memory("mem_1", "x", &["old"])))
            .unwrap();

        let patch = MemoryPatch {
            metadata: Some(MetadataPatch {
                tags: Some(vec!["new".to_string()]),
                ..Default::default()
            }),
            ..Default::default()
        };
        storage
            .with_transaction(|conn| update_memory(conn, "mem_1", patch))
            .unwrap();

        let filter = MemoryFilter {
            tags: Some(vec!["old".to_string()]),
            ..Default::default()
        };
        let old = storage
            .with_connection(|conn| list_memories(conn, &filter))
            .unwrap();
        assert!(old.is_empty());

        let hits = storage
            .with_connection(|conn| search_memories(conn, "new", 10))
            .unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_stats_tag_ties_break_by_name() {
        let storage = storage();
        storage
            .with_connection(|conn| {
                create_memory(conn, &memory("mem_1", "a", &["zeta", "alpha"]))?;
                create_memory(conn, &memory("mem_2", "b", &["zeta", "beta"]))?;
                create_memory(conn, &memory("mem_3", "c", &["beta"]))
            })
            .unwrap();

        let stats = storage.with_connection(get_stats).unwrap();
        let tags: Vec<(&str, usize)> = stats
            .top_tags
            .iter()
            .map(|t| (t.tag.as_str(), t.count))
            .collect();
        assert_eq!(tags, vec![("beta", 2), ("zeta", 2), ("alpha", 1)]);
        assert_eq!(stats.by_category.get(&DataCategory::Custom), Some(&3));
    }
}
