//! Wires the store, generator and clock into the three arena services

use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};

use crate::clock::Clock;
use crate::config::ArenaConfig;
use crate::creation::CharacterForge;
use crate::generator::ContentGenerator;
use crate::llm::{LlmClient, LlmError, LlmRequest};
use crate::orchestrator::BattleOrchestrator;
use crate::queries::ArenaQueries;
use crate::store::{ArenaStore, SqliteStore};

pub struct Arena {
    pub battles: BattleOrchestrator,
    pub forge: CharacterForge,
    pub queries: ArenaQueries,
}

impl Arena {
    pub fn assemble(
        store: Arc<dyn ArenaStore>,
        generator: ContentGenerator,
        clock: Arc<dyn Clock>,
        strict_daily_battle: bool,
    ) -> Self {
        Self {
            battles: BattleOrchestrator::new(store.clone(), generator.clone(), clock.clone())
                .with_strict_daily_battle(strict_daily_battle),
            forge: CharacterForge::new(store.clone(), generator, clock.clone()),
            queries: ArenaQueries::new(store, clock),
        }
    }

    /// Opens the configured database. Read-only commands work without an API key.
    pub fn from_config(config: &ArenaConfig, clock: Arc<dyn Clock>) -> Result<Self, String> {
        let db_path = config.database_path()?;
        let store: Arc<dyn ArenaStore> =
            Arc::new(SqliteStore::open(&db_path).map_err(|e| e.to_string())?);
        info!("[arena] database at {:?}", db_path);

        let client: Arc<dyn LlmClient> = match config.build_llm_client() {
            Ok(client) => client,
            Err(e) => {
                warn!("[arena] generation disabled: {}", e);
                Arc::new(Unconfigured(e))
            }
        };
        let generator = ContentGenerator::new(client, config.temperature);
        Ok(Self::assemble(
            store,
            generator,
            clock,
            config.strict_daily_battle,
        ))
    }
}

/// Client used when no API key is configured; every call fails
struct Unconfigured(String);

#[async_trait]
impl LlmClient for Unconfigured {
    async fn complete(&self, _request: LlmRequest) -> Result<String, LlmError> {
        Err(LlmError::Response(self.0.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::creation::NewCharacter;
    use crate::error::ArenaError;

    #[tokio::test]
    async fn unconfigured_generation_still_creates_placeholder_characters() {
        let store: Arc<dyn ArenaStore> = Arc::new(SqliteStore::in_memory().unwrap());
        let generator = ContentGenerator::new(Arc::new(Unconfigured("no key".into())), 0.9);
        let clock = Arc::new(FixedClock::at_day("2025-03-01").unwrap());
        let arena = Arena::assemble(store, generator, clock, true);

        let created = arena
            .forge
            .create(NewCharacter {
                owner: "U1".into(),
                name: "라온".into(),
                description: "바람을 다루는 검사".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(created.id, "2025-03-01_U1");

        let seen = arena.queries.character(&created.id).await.unwrap();
        assert_eq!(seen.name, "라온");
        assert_eq!(
            arena.queries.character("2025-03-01_U2").await.unwrap_err(),
            ArenaError::CharacterNotFound
        );
    }
}
