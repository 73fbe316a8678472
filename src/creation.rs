//! Daily character submission

use std::sync::Arc;

use log::{info, warn};

use crate::clock::Clock;
use crate::error::{ArenaError, ArenaResult};
use crate::generator::{ContentGenerator, DiaryRequest, Generated};
use crate::identity;
use crate::models::Character;
use crate::store::ArenaStore;

const ANONYMOUS: &str = "Anonymous";

#[derive(Debug, Clone, Default)]
pub struct NewCharacter {
    pub owner: String,
    pub author_name: Option<String>,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
}

pub struct CharacterForge {
    store: Arc<dyn ArenaStore>,
    generator: ContentGenerator,
    clock: Arc<dyn Clock>,
}

impl CharacterForge {
    pub fn new(
        store: Arc<dyn ArenaStore>,
        generator: ContentGenerator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            generator,
            clock,
        }
    }

    /// Generates and stores today's character for `input.owner`
    pub async fn create(&self, input: NewCharacter) -> ArenaResult<Character> {
        let name = input.name.trim();
        let description = input.description.trim();
        if input.owner.trim().is_empty() || input.owner.contains('/') {
            return Err(ArenaError::InvalidInput("owner".to_string()));
        }
        if name.is_empty() {
            return Err(ArenaError::InvalidInput("name".to_string()));
        }
        if description.is_empty() {
            return Err(ArenaError::InvalidInput("description".to_string()));
        }

        let now = self.clock.now();
        let day = self.clock.today();
        let id = identity::character_id(&day, &input.owner);

        // One character per owner per day; checked before paying for generation
        if self
            .store
            .get_owner_character(&input.owner, &id)
            .await?
            .is_some()
        {
            return Err(ArenaError::CharacterAlreadyExists);
        }

        let content = self
            .generator
            .generate_character_content(name, description)
            .await?;
        if content.is_degraded() {
            warn!("[create] {} stored with placeholder content", id);
        }
        let content = content.into_inner();

        let summary = match self
            .generator
            .generate_diary_entry(&DiaryRequest::Character {
                name: name.to_string(),
                description: description.to_string(),
            })
            .await
        {
            Generated::Fresh(text) | Generated::Degraded(text) => text,
        };

        let character = Character {
            id,
            owner: input.owner,
            author_name: input
                .author_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| ANONYMOUS.to_string()),
            name: name.to_string(),
            description: description.to_string(),
            abilities: content.abilities,
            narrative: content.narrative,
            summary,
            image_url: input.image_url.filter(|url| !url.is_empty()),
            day,
            created_at: now,
        };

        self.store.put_owner_character(&character).await?;
        self.store.put_day_character(&character).await?;
        info!("[create] stored character {}", character.id);
        Ok(character)
    }
}
