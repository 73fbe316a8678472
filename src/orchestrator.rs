//! Battle workflow
//!
//! Idle -> ResolvingOwnCharacter -> ResolvingOpponentPool -> SelectingOpponent
//!      -> Generating -> PersistingLog -> Done
//!
//! Any stage may halt the run; the halting stage is reported in `BattleFailure`.
//! All preconditions are checked before the generator is called.

use std::fmt;
use std::sync::{Arc, Mutex};

use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::clock::Clock;
use crate::error::{ArenaError, ArenaResult};
use crate::generator::{ContentGenerator, DiaryRequest, Generated};
use crate::identity;
use crate::models::{BattleHandle, BattleRecord, Character, CombatantSnapshot};
use crate::opponent::select_opponent;
use crate::store::ArenaStore;

const LOG_ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleStage {
    Idle,
    ResolvingOwnCharacter,
    ResolvingOpponentPool,
    SelectingOpponent,
    Generating,
    PersistingLog,
    Done,
}

impl fmt::Display for BattleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BattleStage::Idle => "idle",
            BattleStage::ResolvingOwnCharacter => "resolving own character",
            BattleStage::ResolvingOpponentPool => "resolving opponent pool",
            BattleStage::SelectingOpponent => "selecting opponent",
            BattleStage::Generating => "generating",
            BattleStage::PersistingLog => "persisting log",
            BattleStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// A battle run that halted before `Done`
#[derive(Debug, Clone, PartialEq, Error)]
#[error("battle halted while {stage}: {error}")]
pub struct BattleFailure {
    pub stage: BattleStage,
    #[source]
    pub error: ArenaError,
}

#[derive(Debug, Clone)]
pub struct BattleOutcome {
    pub handle: BattleHandle,
    pub record: BattleRecord,
    /// The narrative is the fixed failure sentence rather than generated text
    pub narrative_degraded: bool,
    /// The summary is the fixed battle diary sentence
    pub diary_degraded: bool,
}

pub struct BattleOrchestrator {
    store: Arc<dyn ArenaStore>,
    generator: ContentGenerator,
    clock: Arc<dyn Clock>,
    rng: Mutex<StdRng>,
    strict_daily_battle: bool,
}

impl BattleOrchestrator {
    pub fn new(
        store: Arc<dyn ArenaStore>,
        generator: ContentGenerator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            generator,
            clock,
            rng: Mutex::new(StdRng::from_entropy()),
            strict_daily_battle: false,
        }
    }

    /// Replaces the random source used for opponent picks and log ids
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    /// Refuse a second battle for the same initiator instead of trusting the caller
    pub fn with_strict_daily_battle(mut self, strict: bool) -> Self {
        self.strict_daily_battle = strict;
        self
    }

    pub async fn run(
        &self,
        owner: &str,
        character_id: &str,
    ) -> Result<BattleOutcome, BattleFailure> {
        let mut stage = BattleStage::Idle;
        match self.execute(owner, character_id, &mut stage).await {
            Ok(outcome) => {
                info!(
                    "[battle] {} finished with log {}",
                    character_id, outcome.handle.log_id
                );
                Ok(outcome)
            }
            Err(error) => {
                warn!("[battle] {} halted while {}: {}", character_id, stage, error);
                Err(BattleFailure { stage, error })
            }
        }
    }

    fn advance(stage: &mut BattleStage, next: BattleStage) {
        debug!("[battle] {} -> {}", stage, next);
        *stage = next;
    }

    async fn execute(
        &self,
        owner: &str,
        character_id: &str,
        stage: &mut BattleStage,
    ) -> ArenaResult<BattleOutcome> {
        Self::advance(stage, BattleStage::ResolvingOwnCharacter);
        let me = self
            .store
            .get_owner_character(owner, character_id)
            .await?
            .ok_or(ArenaError::CharacterNotFound)?;
        if self.strict_daily_battle && self.has_initiated(owner, character_id).await? {
            return Err(ArenaError::AlreadyBattled);
        }

        Self::advance(stage, BattleStage::ResolvingOpponentPool);
        let day = identity::day_of(character_id).ok_or(ArenaError::InvalidIdentity)?;
        let pool = self.store.list_day_characters(day).await?;

        Self::advance(stage, BattleStage::SelectingOpponent);
        let opponent = {
            let mut rng = self.lock_rng()?;
            select_opponent(&pool, owner, &mut *rng)?.clone()
        };
        info!("[battle] {} vs {}", me.id, opponent.id);

        Self::advance(stage, BattleStage::Generating);
        let narrative = self.generator.generate_battle_narrative(&me, &opponent).await?;
        let narrative_degraded = narrative.is_degraded();
        let log = narrative.into_inner();
        let diary = self.battle_diary(&me, &opponent, &log).await;
        let diary_degraded = diary.is_degraded();
        let summary = diary.into_inner();

        Self::advance(stage, BattleStage::PersistingLog);
        let record = BattleRecord {
            day: day.to_string(),
            player_a: CombatantSnapshot::of(&me),
            player_b: CombatantSnapshot::of(&opponent),
            log,
            summary,
            created_at: self.clock.now(),
        };
        let log_id = self.mint_log_id()?;
        self.persist_battle_record(owner, character_id, &log_id, &record)
            .await?;

        Self::advance(stage, BattleStage::Done);
        Ok(BattleOutcome {
            handle: BattleHandle {
                character_id: character_id.to_string(),
                log_id,
            },
            record,
            narrative_degraded,
            diary_degraded,
        })
    }

    /// Diary text for the battle; the fixed diary sentence when generation fell back
    async fn battle_diary(
        &self,
        me: &Character,
        opponent: &Character,
        log: &str,
    ) -> Generated<String> {
        let request = DiaryRequest::Battle {
            name: me.name.clone(),
            opponent_name: opponent.name.clone(),
            battle_log: log.to_string(),
        };
        let diary = self.generator.generate_diary_entry(&request).await;
        if diary.is_degraded() {
            warn!("[battle] diary for {} fell back to the fixed sentence", me.id);
        }
        diary
    }

    async fn has_initiated(&self, owner: &str, character_id: &str) -> ArenaResult<bool> {
        let logs = self.store.list_owner_logs(owner, character_id).await?;
        Ok(logs
            .iter()
            .any(|stored| stored.record.player_a.character_id == character_id))
    }

    /// Writes the record to the owner view, then the day view.
    ///
    /// The two writes are not transactional. If the day-view write fails the
    /// owner-view copy stays in place and the whole call reports `PersistenceFailure`.
    pub async fn persist_battle_record(
        &self,
        owner: &str,
        character_id: &str,
        log_id: &str,
        record: &BattleRecord,
    ) -> ArenaResult<()> {
        self.store
            .put_owner_log(owner, character_id, log_id, record)
            .await
            .map_err(|e| {
                error!("[battle] owner-view write failed for {}: {}", log_id, e);
                ArenaError::PersistenceFailure(format!("owner view: {}", e))
            })?;

        self.store
            .put_day_log(&record.day, character_id, log_id, record)
            .await
            .map_err(|e| {
                error!(
                    "[battle] day-view write failed for {}; owner-view copy left in place: {}",
                    log_id, e
                );
                ArenaError::PersistenceFailure(format!("day view: {}", e))
            })
    }

    /// `{micros}_{9 base36 chars}`
    fn mint_log_id(&self) -> ArenaResult<String> {
        let mut rng = self.lock_rng()?;
        let suffix: String = (0..LOG_ID_SUFFIX_LEN)
            .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
            .collect();
        Ok(format!("{}_{}", self.clock.now().timestamp_micros(), suffix))
    }

    fn lock_rng(&self) -> ArenaResult<std::sync::MutexGuard<'_, StdRng>> {
        self.rng
            .lock()
            .map_err(|_| ArenaError::Unknown("random source lock poisoned".to_string()))
    }
}
