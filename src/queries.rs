//! Read paths over both views
//!
//! Day-scoped reads go through the lifecycle gate; the owner's own book does not.

use std::sync::Arc;

use serde::Serialize;

use crate::clock::{self, Clock};
use crate::error::{ArenaError, ArenaResult};
use crate::identity;
use crate::lifecycle::ensure_visible;
use crate::models::{BattleRecord, Character, StoredBattle};
use crate::store::ArenaStore;

/// A battle listed with the character it is filed under
#[derive(Debug, Clone, Serialize)]
pub struct FiledBattle {
    pub character_id: String,
    pub log_id: String,
    pub record: BattleRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct TodayBoard {
    pub day: String,
    pub characters: Vec<Character>,
    pub battles: Vec<FiledBattle>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookEntry {
    pub character: Character,
    pub battles: Vec<StoredBattle>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayRecord {
    pub character: Character,
    pub battles: Vec<StoredBattle>,
}

pub struct ArenaQueries {
    store: Arc<dyn ArenaStore>,
    clock: Arc<dyn Clock>,
}

impl ArenaQueries {
    pub fn new(store: Arc<dyn ArenaStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// A character from the day view; `Expired` once its day has passed
    pub async fn character(&self, character_id: &str) -> ArenaResult<Character> {
        let day = identity::day_of(character_id).ok_or(ArenaError::InvalidIdentity)?;
        let character = self
            .store
            .get_day_character(day, character_id)
            .await?
            .ok_or(ArenaError::CharacterNotFound)?;
        ensure_visible(&character.day, self.clock.as_ref())?;
        Ok(character)
    }

    /// A battle record from the day view; `Expired` once its day has passed
    pub async fn battle_log(&self, character_id: &str, log_id: &str) -> ArenaResult<BattleRecord> {
        let day = identity::day_of(character_id).ok_or(ArenaError::InvalidIdentity)?;
        let record = self
            .store
            .get_day_log(day, character_id, log_id)
            .await?
            .ok_or(ArenaError::BattleNotFound)?;
        ensure_visible(&record.day, self.clock.as_ref())?;
        Ok(record)
    }

    /// Everything created today: characters by id descending, battles newest first
    pub async fn today_board(&self) -> ArenaResult<TodayBoard> {
        let day = self.clock.today();
        let mut characters = self.store.list_day_characters(&day).await?;
        characters.retain(|c| c.day == day);

        let mut battles = Vec::new();
        for character in &characters {
            for stored in self.store.list_day_logs(&day, &character.id).await? {
                if stored.record.day != day {
                    continue;
                }
                battles.push(FiledBattle {
                    character_id: character.id.clone(),
                    log_id: stored.log_id,
                    record: stored.record,
                });
            }
        }

        characters.sort_by(|a, b| b.id.cmp(&a.id));
        battles.sort_by(|a, b| b.record.created_at.cmp(&a.record.created_at));
        Ok(TodayBoard {
            day,
            characters,
            battles,
        })
    }

    /// The owner's full history, newest character first; never expires
    pub async fn owner_book(&self, owner: &str) -> ArenaResult<Vec<BookEntry>> {
        let mut characters = self.store.list_owner_characters(owner).await?;
        characters.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut book = Vec::with_capacity(characters.len());
        for character in characters {
            let mut battles = self.store.list_owner_logs(owner, &character.id).await?;
            battles.sort_by(|a, b| b.record.created_at.cmp(&a.record.created_at));
            book.push(BookEntry { character, battles });
        }
        Ok(book)
    }

    /// Whether this character already started a battle (the caller-side one-shot check)
    pub async fn has_battled(&self, owner: &str, character_id: &str) -> ArenaResult<bool> {
        let logs = self.store.list_owner_logs(owner, character_id).await?;
        Ok(logs
            .iter()
            .any(|stored| stored.record.player_a.character_id == character_id))
    }

    /// Admin listing of one day, ungated
    pub async fn day_records(&self, day: &str) -> ArenaResult<Vec<DayRecord>> {
        let characters = self.store.list_day_characters(day).await?;
        let mut records = Vec::with_capacity(characters.len());
        for character in characters {
            let battles = self.store.list_day_logs(day, &character.id).await?;
            records.push(DayRecord { character, battles });
        }
        Ok(records)
    }

    pub fn recent_days(&self, count: usize) -> Vec<String> {
        clock::recent_days(self.clock.as_ref(), count)
    }

    /// Administrative removal from the day view
    pub async fn delete_character(&self, day: &str, character_id: &str) -> ArenaResult<()> {
        if self.store.delete_day_character(day, character_id).await? {
            Ok(())
        } else {
            Err(ArenaError::CharacterNotFound)
        }
    }
}
