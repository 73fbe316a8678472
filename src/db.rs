//! SQLite-backed document collections
//!
//! Documents live in a single table keyed by `(collection, doc_id)`, where the
//! collection is a slash-separated path such as `records/2025-06-01/characters`.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

fn create_schema(conn: &Connection) -> Result<(), String> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS documents (
            collection TEXT NOT NULL,
            doc_id TEXT NOT NULL,
            data TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (collection, doc_id)
        )",
        [],
    )
    .map_err(|e| format!("Failed to create table: {}", e))?;
    Ok(())
}

/// Opens (or creates) the database file and its schema
pub fn init_database(db_path: &Path) -> Result<Connection, String> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create database directory: {}", e))?;
    }

    let conn = Connection::open(db_path).map_err(|e| format!("Failed to open database: {}", e))?;
    create_schema(&conn)?;
    Ok(conn)
}

/// Opens a throwaway in-memory database
pub fn init_memory_database() -> Result<Connection, String> {
    let conn =
        Connection::open_in_memory().map_err(|e| format!("Failed to open database: {}", e))?;
    create_schema(&conn)?;
    Ok(conn)
}

/// Upserts a whole document
pub fn set_document(
    conn: &Connection,
    collection: &str,
    doc_id: &str,
    data: &str,
) -> Result<(), String> {
    let updated_at = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO documents (collection, doc_id, data, updated_at) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(collection, doc_id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
        params![collection, doc_id, data, updated_at],
    )
    .map_err(|e| format!("Failed to store document {}/{}: {}", collection, doc_id, e))?;
    Ok(())
}

pub fn get_document(
    conn: &Connection,
    collection: &str,
    doc_id: &str,
) -> Result<Option<String>, String> {
    conn.query_row(
        "SELECT data FROM documents WHERE collection = ?1 AND doc_id = ?2",
        params![collection, doc_id],
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| format!("Failed to read document {}/{}: {}", collection, doc_id, e))
}

/// Lists `(doc_id, data)` pairs of a collection, ordered by id
pub fn list_documents(conn: &Connection, collection: &str) -> Result<Vec<(String, String)>, String> {
    let mut stmt = conn
        .prepare("SELECT doc_id, data FROM documents WHERE collection = ?1 ORDER BY doc_id")
        .map_err(|e| format!("Failed to prepare query: {}", e))?;

    let rows = stmt
        .query_map(params![collection], |row| Ok((row.get(0)?, row.get(1)?)))
        .map_err(|e| format!("Failed to query: {}", e))?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("Failed to read row: {}", e))
}

/// Deletes one document; returns whether it existed
pub fn delete_document(conn: &Connection, collection: &str, doc_id: &str) -> Result<bool, String> {
    let removed = conn
        .execute(
            "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2",
            params![collection, doc_id],
        )
        .map_err(|e| format!("Failed to delete document: {}", e))?;
    Ok(removed > 0)
}

/// Deletes every document of a collection
pub fn clear_collection(conn: &Connection, collection: &str) -> Result<usize, String> {
    conn.execute(
        "DELETE FROM documents WHERE collection = ?1",
        params![collection],
    )
    .map_err(|e| format!("Failed to clear collection: {}", e))
}
