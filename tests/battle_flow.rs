use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;

use daily_arena::clock::FixedClock;
use daily_arena::generator::{ContentGenerator, BATTLE_DIARY_FALLBACK, BATTLE_LOG_FAILURE};
use daily_arena::identity;
use daily_arena::llm::{LlmClient, LlmError, LlmRequest};
use daily_arena::models::{BattleRecord, Character, StoredBattle};
use daily_arena::queries::ArenaQueries;
use daily_arena::store::{ArenaStore, SqliteStore, StoreError, StoreResult};
use daily_arena::{ArenaError, BattleOrchestrator, BattleStage};

const DAY: &str = "2025-06-01";

#[derive(Clone)]
enum Reply {
    Text(&'static str),
    Fail(&'static str),
}

/// Replies from a queue, then repeats the last reply; counts every call
struct Scripted {
    replies: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for Scripted {
    async fn complete(&self, _request: LlmRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = {
            let mut replies = self.replies.lock().unwrap();
            if replies.len() > 1 {
                replies.pop_front()
            } else {
                replies.front().cloned()
            }
        };
        match reply {
            Some(Reply::Text(text)) => Ok(text.to_string()),
            Some(Reply::Fail(message)) => Err(LlmError::Response(message.to_string())),
            None => Ok(String::new()),
        }
    }
}

fn character(owner: &str, name: &str) -> Character {
    Character {
        id: identity::character_id(DAY, owner),
        owner: owner.to_string(),
        author_name: format!("{} 작가", owner),
        name: name.to_string(),
        description: format!("{}의 설정", name),
        abilities: vec!["불꽃: 태운다".into(), "방패: 막는다".into()],
        narrative: "서사".into(),
        summary: String::new(),
        image_url: None,
        day: DAY.to_string(),
        created_at: Utc::now(),
    }
}

async fn seed(store: &dyn ArenaStore, owners: &[&str]) -> Vec<Character> {
    let mut seeded = Vec::new();
    for (i, owner) in owners.iter().enumerate() {
        let c = character(owner, &format!("전사{}", i));
        store.put_owner_character(&c).await.unwrap();
        store.put_day_character(&c).await.unwrap();
        seeded.push(c);
    }
    seeded
}

fn orchestrator(store: Arc<dyn ArenaStore>, client: Arc<Scripted>) -> BattleOrchestrator {
    BattleOrchestrator::new(
        store,
        ContentGenerator::new(client, 0.9),
        Arc::new(FixedClock::at_day(DAY).unwrap()),
    )
    .with_rng(StdRng::seed_from_u64(7))
}

#[tokio::test]
async fn battle_is_recorded_in_both_views_under_one_log_id() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let seeded = seed(store.as_ref(), &["U1", "U2", "U3", "U4", "U5"]).await;
    let me = &seeded[0];
    let client = Scripted::new(vec![
        Reply::Text("두 전사가 맞섰다.\n\n> 간다!\n**불꽃**이 번졌다."),
        Reply::Text("잊지 못할 하루였다."),
    ]);

    let outcome = orchestrator(store.clone(), client.clone())
        .run("U1", &me.id)
        .await
        .unwrap();

    assert_eq!(client.calls(), 2);
    assert!(!outcome.narrative_degraded);
    assert_eq!(outcome.record.player_a.name, me.name);
    assert_ne!(outcome.record.player_b.owner, "U1");
    assert_eq!(outcome.record.day, DAY);
    assert_eq!(outcome.record.summary, "잊지 못할 하루였다.");

    let log_id = &outcome.handle.log_id;
    let owner_view = store.list_owner_logs("U1", &me.id).await.unwrap();
    assert_eq!(owner_view.len(), 1);
    assert_eq!(&owner_view[0].log_id, log_id);

    let day_view = store.get_day_log(DAY, &me.id, log_id).await.unwrap().unwrap();
    assert_eq!(day_view, owner_view[0].record);
}

#[tokio::test]
async fn three_opponents_is_not_enough_and_skips_generation() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let seeded = seed(store.as_ref(), &["U1", "U2", "U3", "U4"]).await;
    let client = Scripted::new(vec![Reply::Text("never")]);

    let failure = orchestrator(store.clone(), client.clone())
        .run("U1", &seeded[0].id)
        .await
        .unwrap_err();

    assert_eq!(failure.stage, BattleStage::SelectingOpponent);
    assert_eq!(
        failure.error,
        ArenaError::InsufficientPopulation { current: 4 }
    );
    assert_eq!(client.calls(), 0);
    assert!(store
        .list_owner_logs("U1", &seeded[0].id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn quota_errors_surface_as_overload_and_store_nothing() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let seeded = seed(store.as_ref(), &["U1", "U2", "U3", "U4", "U5"]).await;
    let client = Scripted::new(vec![Reply::Fail("Quota exceeded for model")]);

    let failure = orchestrator(store.clone(), client.clone())
        .run("U1", &seeded[0].id)
        .await
        .unwrap_err();

    assert_eq!(failure.stage, BattleStage::Generating);
    assert_eq!(failure.error, ArenaError::Overloaded);
    assert!(failure.error.user_message().contains("(429)"));
    assert_eq!(client.calls(), 1);
    assert!(store
        .list_owner_logs("U1", &seeded[0].id)
        .await
        .unwrap()
        .is_empty());
    assert!(store
        .list_day_logs(DAY, &seeded[0].id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn other_generation_errors_record_the_failure_sentence() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let seeded = seed(store.as_ref(), &["U1", "U2", "U3", "U4", "U5"]).await;
    let client = Scripted::new(vec![Reply::Fail("socket closed")]);

    let outcome = orchestrator(store.clone(), client)
        .run("U1", &seeded[0].id)
        .await
        .unwrap();

    assert!(outcome.narrative_degraded);
    assert!(outcome.diary_degraded);
    assert_eq!(outcome.record.log, BATTLE_LOG_FAILURE);
    assert_eq!(outcome.record.summary, BATTLE_DIARY_FALLBACK);
}

#[tokio::test]
async fn failed_diary_keeps_the_fixed_diary_sentence() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let seeded = seed(store.as_ref(), &["U1", "U2", "U3", "U4", "U5"]).await;
    let client = Scripted::new(vec![
        Reply::Text("불꽃이 번졌다."),
        Reply::Fail("socket closed"),
    ]);

    let outcome = orchestrator(store.clone(), client)
        .run("U1", &seeded[0].id)
        .await
        .unwrap();

    assert!(!outcome.narrative_degraded);
    assert!(outcome.diary_degraded);
    assert_eq!(outcome.record.log, "불꽃이 번졌다.");

    let stored = store.list_owner_logs("U1", &seeded[0].id).await.unwrap();
    assert_eq!(stored[0].record.summary, BATTLE_DIARY_FALLBACK);
}

#[tokio::test]
async fn missing_character_halts_before_the_pool_is_read() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    seed(store.as_ref(), &["U2", "U3", "U4", "U5", "U6"]).await;
    let client = Scripted::new(vec![Reply::Text("never")]);

    let failure = orchestrator(store, client.clone())
        .run("U1", &identity::character_id(DAY, "U1"))
        .await
        .unwrap_err();

    assert_eq!(failure.stage, BattleStage::ResolvingOwnCharacter);
    assert_eq!(failure.error, ArenaError::CharacterNotFound);
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn strict_mode_refuses_a_second_battle() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let seeded = seed(store.as_ref(), &["U1", "U2", "U3", "U4", "U5"]).await;
    let client = Scripted::new(vec![Reply::Text("전투")]);
    let battles = orchestrator(store.clone(), client).with_strict_daily_battle(true);

    battles.run("U1", &seeded[0].id).await.unwrap();
    let failure = battles.run("U1", &seeded[0].id).await.unwrap_err();
    assert_eq!(failure.stage, BattleStage::ResolvingOwnCharacter);
    assert_eq!(failure.error, ArenaError::AlreadyBattled);

    let queries = ArenaQueries::new(store, Arc::new(FixedClock::at_day(DAY).unwrap()));
    assert!(queries.has_battled("U1", &seeded[0].id).await.unwrap());
}

#[tokio::test]
async fn records_expire_for_day_readers_but_not_for_owners() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let seeded = seed(store.as_ref(), &["U1", "U2", "U3", "U4", "U5"]).await;
    let client = Scripted::new(vec![Reply::Text("전투")]);
    let outcome = orchestrator(store.clone(), client)
        .run("U1", &seeded[0].id)
        .await
        .unwrap();
    let handle = outcome.handle;

    let today = ArenaQueries::new(store.clone(), Arc::new(FixedClock::at_day(DAY).unwrap()));
    today
        .battle_log(&handle.character_id, &handle.log_id)
        .await
        .unwrap();
    assert_eq!(today.today_board().await.unwrap().battles.len(), 1);

    let tomorrow = ArenaQueries::new(
        store,
        Arc::new(FixedClock::at_day("2025-06-02").unwrap()),
    );
    assert_eq!(
        tomorrow
            .battle_log(&handle.character_id, &handle.log_id)
            .await
            .unwrap_err(),
        ArenaError::Expired
    );
    assert!(tomorrow.today_board().await.unwrap().battles.is_empty());
    assert_eq!(tomorrow.owner_book("U1").await.unwrap()[0].battles.len(), 1);
}

/// Delegates to SQLite but can reject log writes to either view
struct FlakyStore {
    inner: SqliteStore,
    owner_logs_down: bool,
    day_logs_down: bool,
}

impl FlakyStore {
    fn new(owner_logs_down: bool, day_logs_down: bool) -> Self {
        Self {
            inner: SqliteStore::in_memory().unwrap(),
            owner_logs_down,
            day_logs_down,
        }
    }
}

#[async_trait]
impl ArenaStore for FlakyStore {
    async fn get_owner_character(
        &self,
        owner: &str,
        character_id: &str,
    ) -> StoreResult<Option<Character>> {
        self.inner.get_owner_character(owner, character_id).await
    }

    async fn list_owner_characters(&self, owner: &str) -> StoreResult<Vec<Character>> {
        self.inner.list_owner_characters(owner).await
    }

    async fn put_owner_character(&self, character: &Character) -> StoreResult<()> {
        self.inner.put_owner_character(character).await
    }

    async fn get_day_character(
        &self,
        day: &str,
        character_id: &str,
    ) -> StoreResult<Option<Character>> {
        self.inner.get_day_character(day, character_id).await
    }

    async fn list_day_characters(&self, day: &str) -> StoreResult<Vec<Character>> {
        self.inner.list_day_characters(day).await
    }

    async fn put_day_character(&self, character: &Character) -> StoreResult<()> {
        self.inner.put_day_character(character).await
    }

    async fn delete_day_character(&self, day: &str, character_id: &str) -> StoreResult<bool> {
        self.inner.delete_day_character(day, character_id).await
    }

    async fn put_owner_log(
        &self,
        owner: &str,
        character_id: &str,
        log_id: &str,
        record: &BattleRecord,
    ) -> StoreResult<()> {
        if self.owner_logs_down {
            return Err(StoreError::Write("quota exhausted".to_string()));
        }
        self.inner
            .put_owner_log(owner, character_id, log_id, record)
            .await
    }

    async fn list_owner_logs(
        &self,
        owner: &str,
        character_id: &str,
    ) -> StoreResult<Vec<StoredBattle>> {
        self.inner.list_owner_logs(owner, character_id).await
    }

    async fn put_day_log(
        &self,
        day: &str,
        character_id: &str,
        log_id: &str,
        record: &BattleRecord,
    ) -> StoreResult<()> {
        if self.day_logs_down {
            return Err(StoreError::Write("disk full".to_string()));
        }
        self.inner.put_day_log(day, character_id, log_id, record).await
    }

    async fn get_day_log(
        &self,
        day: &str,
        character_id: &str,
        log_id: &str,
    ) -> StoreResult<Option<BattleRecord>> {
        self.inner.get_day_log(day, character_id, log_id).await
    }

    async fn list_day_logs(
        &self,
        day: &str,
        character_id: &str,
    ) -> StoreResult<Vec<StoredBattle>> {
        self.inner.list_day_logs(day, character_id).await
    }
}

#[tokio::test]
async fn day_view_failure_reports_persistence_and_keeps_owner_copy() {
    let store = Arc::new(FlakyStore::new(false, true));
    let seeded = seed(store.as_ref(), &["U1", "U2", "U3", "U4", "U5"]).await;
    let client = Scripted::new(vec![Reply::Text("전투")]);

    let failure = orchestrator(store.clone(), client)
        .run("U1", &seeded[0].id)
        .await
        .unwrap_err();

    assert_eq!(failure.stage, BattleStage::PersistingLog);
    assert!(matches!(
        failure.error,
        ArenaError::PersistenceFailure(ref msg) if msg.starts_with("day view")
    ));
    assert_eq!(
        store.list_owner_logs("U1", &seeded[0].id).await.unwrap().len(),
        1
    );
    assert!(store
        .list_day_logs(DAY, &seeded[0].id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn owner_view_failure_skips_the_day_view_write() {
    let store = Arc::new(FlakyStore::new(true, false));
    let seeded = seed(store.as_ref(), &["U1", "U2", "U3", "U4", "U5"]).await;
    let client = Scripted::new(vec![Reply::Text("전투")]);

    let failure = orchestrator(store.clone(), client)
        .run("U1", &seeded[0].id)
        .await
        .unwrap_err();

    assert_eq!(failure.stage, BattleStage::PersistingLog);
    assert!(matches!(
        failure.error,
        ArenaError::PersistenceFailure(ref msg) if msg.starts_with("owner view")
    ));
    assert!(store
        .list_owner_logs("U1", &seeded[0].id)
        .await
        .unwrap()
        .is_empty());
    assert!(store
        .list_day_logs(DAY, &seeded[0].id)
        .await
        .unwrap()
        .is_empty());
}
