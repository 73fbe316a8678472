//! Error taxonomy shared by every arena workflow

use thiserror::Error;

/// Errors surfaced by the arena core
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArenaError {
    #[error("character not found")]
    CharacterNotFound,
    #[error("battle log not found")]
    BattleNotFound,
    #[error("character id could not be parsed into a day")]
    InvalidIdentity,
    #[error("not enough characters for a battle (current: {current})")]
    InsufficientPopulation { current: usize },
    /// The generation service rejected the call for rate or quota reasons
    #[error("generation service overloaded")]
    Overloaded,
    #[error("persistence failure: {0}")]
    PersistenceFailure(String),
    #[error("record is no longer visible")]
    Expired,
    #[error("a character already exists for this owner today")]
    CharacterAlreadyExists,
    #[error("this character has already battled today")]
    AlreadyBattled,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unknown error: {0}")]
    Unknown(String),
}

impl ArenaError {
    /// Short localized message safe to show to an end user
    pub fn user_message(&self) -> String {
        match self {
            ArenaError::CharacterNotFound => "캐릭터를 찾을 수 없습니다.".to_string(),
            ArenaError::BattleNotFound => "배틀 기록을 찾을 수 없습니다.".to_string(),
            ArenaError::InvalidIdentity => "잘못된 캐릭터 ID입니다.".to_string(),
            ArenaError::InsufficientPopulation { current } => format!(
                "배틀을 위해 최소 5명의 캐릭터가 필요합니다. (현재: {}명)",
                current
            ),
            ArenaError::Overloaded => {
                "이용자가 많아 AI가 과부하 상태입니다. 잠시 후 다시 시도해주세요. (429)"
                    .to_string()
            }
            ArenaError::PersistenceFailure(_) => {
                "기록을 저장하지 못했습니다. 다시 시도해주세요.".to_string()
            }
            ArenaError::Expired => {
                "기록이 만료되었습니다. 오늘의 기록만 볼 수 있습니다.".to_string()
            }
            ArenaError::CharacterAlreadyExists => "오늘은 이미 캐릭터를 만들었습니다.".to_string(),
            ArenaError::AlreadyBattled => "오늘의 배틀은 이미 끝났습니다.".to_string(),
            ArenaError::InvalidInput(_) => "입력값을 확인해주세요.".to_string(),
            ArenaError::Unknown(_) => "알 수 없는 오류가 발생했습니다.".to_string(),
        }
    }

    /// Errors that the caller may fix by re-invoking the whole workflow later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ArenaError::Overloaded | ArenaError::PersistenceFailure(_)
        )
    }
}

pub type ArenaResult<T> = Result<T, ArenaError>;
