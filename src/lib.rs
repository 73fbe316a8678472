//! Daily character arena: one character per owner per day, one AI-narrated battle each

pub mod arena;
pub mod clock;
pub mod config;
pub mod creation;
pub mod db;
pub mod error;
pub mod generator;
pub mod identity;
pub mod lifecycle;
pub mod llm;
pub mod models;
pub mod narrative;
pub mod opponent;
pub mod orchestrator;
pub mod paths;
pub mod prompts;
pub mod queries;
pub mod store;

pub use arena::Arena;
pub use config::ArenaConfig;
pub use error::{ArenaError, ArenaResult};
pub use orchestrator::{BattleFailure, BattleOrchestrator, BattleOutcome, BattleStage};
