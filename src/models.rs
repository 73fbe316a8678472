//! Data models and structures used throughout the application

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A daily character, stored once per owner per day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    /// `{day}_{owner}`
    pub id: String,
    pub owner: String,
    #[serde(default)]
    pub author_name: String,
    pub name: String,
    pub description: String,
    /// Exactly two entries, each `"name: description"`
    pub abilities: Vec<String>,
    pub narrative: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Creation day, `YYYY-MM-DD`
    pub day: String,
    pub created_at: DateTime<Utc>,
}

/// Denormalized copy of one side of a battle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatantSnapshot {
    pub character_id: String,
    pub owner: String,
    pub name: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub abilities: Vec<String>,
}

impl CombatantSnapshot {
    pub fn of(character: &Character) -> Self {
        Self {
            character_id: character.id.clone(),
            owner: character.owner.clone(),
            name: character.name.clone(),
            image_url: character.image_url.clone().unwrap_or_default(),
            abilities: character.abilities.clone(),
        }
    }
}

/// One finished battle; A is always the initiator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleRecord {
    pub day: String,
    pub player_a: CombatantSnapshot,
    pub player_b: CombatantSnapshot,
    pub log: String,
    #[serde(default)]
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

/// A stored battle record together with its log id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredBattle {
    pub log_id: String,
    pub record: BattleRecord,
}

/// Retrieval handle for a completed battle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleHandle {
    pub character_id: String,
    pub log_id: String,
}

/// Generated character content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterContent {
    pub abilities: Vec<String>,
    pub narrative: String,
}

/// A parsed `"name: description"` ability string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ability {
    pub name: String,
    pub description: String,
}

impl Ability {
    /// Splits on the first `:`; a bare name gets an empty description
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(':') {
            Some((name, description)) => Self {
                name: name.trim().to_string(),
                description: description.trim().to_string(),
            },
            None => Self {
                name: raw.trim().to_string(),
                description: String::new(),
            },
        }
    }
}
