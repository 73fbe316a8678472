//! Hierarchical document store behind the arena
//!
//! Two views hold the same data:
//! - owner view: `users/{owner}/characters/{charId}/logs/{logId}`
//! - day view:   `records/{day}/characters/{charId}/logs/{logId}`

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use log::debug;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::db;
use crate::error::ArenaError;
use crate::models::{BattleRecord, Character, StoredBattle};

/// Storage failure, split by whether data was being read or written
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0}")]
    Read(String),
    #[error("{0}")]
    Write(String),
}

impl From<StoreError> for ArenaError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Read(message) => ArenaError::Unknown(message),
            StoreError::Write(message) => ArenaError::PersistenceFailure(message),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

pub fn owner_characters(owner: &str) -> String {
    format!("users/{}/characters", owner)
}

pub fn owner_logs(owner: &str, character_id: &str) -> String {
    format!("users/{}/characters/{}/logs", owner, character_id)
}

pub fn day_characters(day: &str) -> String {
    format!("records/{}/characters", day)
}

pub fn day_logs(day: &str, character_id: &str) -> String {
    format!("records/{}/characters/{}/logs", day, character_id)
}

#[async_trait]
pub trait ArenaStore: Send + Sync {
    async fn get_owner_character(
        &self,
        owner: &str,
        character_id: &str,
    ) -> StoreResult<Option<Character>>;

    async fn list_owner_characters(&self, owner: &str) -> StoreResult<Vec<Character>>;

    async fn put_owner_character(&self, character: &Character) -> StoreResult<()>;

    async fn get_day_character(&self, day: &str, character_id: &str)
        -> StoreResult<Option<Character>>;

    async fn list_day_characters(&self, day: &str) -> StoreResult<Vec<Character>>;

    async fn put_day_character(&self, character: &Character) -> StoreResult<()>;

    /// Removes a character and its logs from the day view
    async fn delete_day_character(&self, day: &str, character_id: &str) -> StoreResult<bool>;

    async fn put_owner_log(
        &self,
        owner: &str,
        character_id: &str,
        log_id: &str,
        record: &BattleRecord,
    ) -> StoreResult<()>;

    async fn list_owner_logs(&self, owner: &str, character_id: &str)
        -> StoreResult<Vec<StoredBattle>>;

    async fn put_day_log(
        &self,
        day: &str,
        character_id: &str,
        log_id: &str,
        record: &BattleRecord,
    ) -> StoreResult<()>;

    async fn get_day_log(
        &self,
        day: &str,
        character_id: &str,
        log_id: &str,
    ) -> StoreResult<Option<BattleRecord>>;

    async fn list_day_logs(&self, day: &str, character_id: &str) -> StoreResult<Vec<StoredBattle>>;
}

/// `ArenaStore` over a single SQLite connection
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(db_path: &Path) -> StoreResult<Self> {
        let conn = db::init_database(db_path).map_err(StoreError::Write)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> StoreResult<Self> {
        let conn = db::init_memory_database().map_err(StoreError::Write)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, String> {
        self.conn
            .lock()
            .map_err(|_| "Database lock poisoned".to_string())
    }

    fn set<T: Serialize>(&self, collection: &str, doc_id: &str, value: &T) -> StoreResult<()> {
        let data = serde_json::to_string(value)
            .map_err(|e| StoreError::Write(format!("Failed to serialize document: {}", e)))?;
        debug!("[store] set {}/{}", collection, doc_id);
        let conn = self.lock().map_err(StoreError::Write)?;
        db::set_document(&conn, collection, doc_id, &data).map_err(StoreError::Write)
    }

    fn delete_with_logs(&self, day: &str, character_id: &str) -> StoreResult<bool> {
        let conn = self.lock().map_err(StoreError::Write)?;
        db::clear_collection(&conn, &day_logs(day, character_id)).map_err(StoreError::Write)?;
        db::delete_document(&conn, &day_characters(day), character_id).map_err(StoreError::Write)
    }

    fn get<T: DeserializeOwned>(&self, collection: &str, doc_id: &str) -> StoreResult<Option<T>> {
        let conn = self.lock().map_err(StoreError::Read)?;
        let data = db::get_document(&conn, collection, doc_id).map_err(StoreError::Read)?;
        data.map(|raw| decode(collection, doc_id, &raw)).transpose()
    }

    fn list<T: DeserializeOwned>(&self, collection: &str) -> StoreResult<Vec<(String, T)>> {
        let conn = self.lock().map_err(StoreError::Read)?;
        let rows = db::list_documents(&conn, collection).map_err(StoreError::Read)?;
        rows.into_iter()
            .map(|(doc_id, raw)| decode(collection, &doc_id, &raw).map(|value| (doc_id, value)))
            .collect()
    }
}

fn decode<T: DeserializeOwned>(collection: &str, doc_id: &str, raw: &str) -> StoreResult<T> {
    serde_json::from_str(raw).map_err(|e| {
        StoreError::Read(format!(
            "Failed to parse document {}/{}: {}",
            collection, doc_id, e
        ))
    })
}

fn into_battles(rows: Vec<(String, BattleRecord)>) -> Vec<StoredBattle> {
    rows.into_iter()
        .map(|(log_id, record)| StoredBattle { log_id, record })
        .collect()
}

#[async_trait]
impl ArenaStore for SqliteStore {
    async fn get_owner_character(
        &self,
        owner: &str,
        character_id: &str,
    ) -> StoreResult<Option<Character>> {
        self.get(&owner_characters(owner), character_id)
    }

    async fn list_owner_characters(&self, owner: &str) -> StoreResult<Vec<Character>> {
        Ok(self
            .list(&owner_characters(owner))?
            .into_iter()
            .map(|(_, c)| c)
            .collect())
    }

    async fn put_owner_character(&self, character: &Character) -> StoreResult<()> {
        self.set(&owner_characters(&character.owner), &character.id, character)
    }

    async fn get_day_character(
        &self,
        day: &str,
        character_id: &str,
    ) -> StoreResult<Option<Character>> {
        self.get(&day_characters(day), character_id)
    }

    async fn list_day_characters(&self, day: &str) -> StoreResult<Vec<Character>> {
        Ok(self
            .list(&day_characters(day))?
            .into_iter()
            .map(|(_, c)| c)
            .collect())
    }

    async fn put_day_character(&self, character: &Character) -> StoreResult<()> {
        self.set(&day_characters(&character.day), &character.id, character)
    }

    async fn delete_day_character(&self, day: &str, character_id: &str) -> StoreResult<bool> {
        self.delete_with_logs(day, character_id)
    }

    async fn put_owner_log(
        &self,
        owner: &str,
        character_id: &str,
        log_id: &str,
        record: &BattleRecord,
    ) -> StoreResult<()> {
        self.set(&owner_logs(owner, character_id), log_id, record)
    }

    async fn list_owner_logs(
        &self,
        owner: &str,
        character_id: &str,
    ) -> StoreResult<Vec<StoredBattle>> {
        Ok(into_battles(self.list(&owner_logs(owner, character_id))?))
    }

    async fn put_day_log(
        &self,
        day: &str,
        character_id: &str,
        log_id: &str,
        record: &BattleRecord,
    ) -> StoreResult<()> {
        self.set(&day_logs(day, character_id), log_id, record)
    }

    async fn get_day_log(
        &self,
        day: &str,
        character_id: &str,
        log_id: &str,
    ) -> StoreResult<Option<BattleRecord>> {
        self.get(&day_logs(day, character_id), log_id)
    }

    async fn list_day_logs(&self, day: &str, character_id: &str) -> StoreResult<Vec<StoredBattle>> {
        Ok(into_battles(self.list(&day_logs(day, character_id))?))
    }
}
