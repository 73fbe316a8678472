//! Content generation on top of an `LlmClient`
//!
//! Each operation makes exactly one model call. Failures are classified as
//! `Overloaded` (rate limit / quota, surfaced as `ArenaError::Overloaded`) or
//! `Unknown` (replaced by fixed placeholder text, reported as `Generated::Degraded`).

use std::sync::Arc;

use log::{error, info, warn};
use serde_json::Value;

use crate::error::{ArenaError, ArenaResult};
use crate::llm::{LlmClient, LlmError, LlmRequest};
use crate::models::{Character, CharacterContent};
use crate::prompts::{battle_prompt, character_prompt, diary_prompt};

pub const FALLBACK_ABILITIES: [&str; 2] = ["기본 공격", "방어"];
pub const FALLBACK_NARRATIVE: &str = "서사가 생성되지 않았습니다.";
pub const LOST_ABILITIES: [&str; 2] = ["??", "??"];
pub const LOST_NARRATIVE: &str = "알 수 없는 힘에 의해 기록이 소실되었습니다.";
pub const BATTLE_LOG_FAILURE: &str = "배틀 로그 생성에 실패했습니다.";
pub const CHARACTER_DIARY_FALLBACK: &str = "오늘의 기억은 희미하게 남았다...";
pub const BATTLE_DIARY_FALLBACK: &str = "그날의 전투는 잊을 수 없는 기억으로 남았다...";

const RAW_LOG_CHARS: usize = 500;
const QUOTA_MARKERS: [&str; 3] = ["429", "Quota", "RESOURCE_EXHAUSTED"];

/// Generated content, or the placeholder that replaced it
#[derive(Debug, Clone, PartialEq)]
pub enum Generated<T> {
    Fresh(T),
    Degraded(T),
}

impl<T> Generated<T> {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Generated::Degraded(_))
    }

    pub fn value(&self) -> &T {
        match self {
            Generated::Fresh(v) | Generated::Degraded(v) => v,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Generated::Fresh(v) | Generated::Degraded(v) => v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Overloaded,
    Unknown,
}

/// 429 status, a literal "429", or a quota marker means overload
pub fn classify_failure(err: &LlmError) -> FailureClass {
    if err.status() == Some(429) {
        return FailureClass::Overloaded;
    }
    classify_message(&err.to_string())
}

pub fn classify_message(message: &str) -> FailureClass {
    if QUOTA_MARKERS.iter().any(|marker| message.contains(marker)) {
        FailureClass::Overloaded
    } else {
        FailureClass::Unknown
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiaryKind {
    Character,
    Battle,
}

#[derive(Debug, Clone)]
pub enum DiaryRequest {
    Character {
        name: String,
        description: String,
    },
    Battle {
        name: String,
        opponent_name: String,
        battle_log: String,
    },
}

impl DiaryRequest {
    pub fn kind(&self) -> DiaryKind {
        match self {
            DiaryRequest::Character { .. } => DiaryKind::Character,
            DiaryRequest::Battle { .. } => DiaryKind::Battle,
        }
    }
}

fn diary_fallback(kind: DiaryKind) -> &'static str {
    match kind {
        DiaryKind::Character => CHARACTER_DIARY_FALLBACK,
        DiaryKind::Battle => BATTLE_DIARY_FALLBACK,
    }
}

fn truncate_for_log(text: &str) -> String {
    text.chars().take(RAW_LOG_CHARS).collect()
}

/// Finds a JSON object in raw model output.
///
/// Tries the text as-is, then the span from the first `{` to the last `}`,
/// then the text with Markdown code fences stripped.
pub fn extract_json(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    let candidates = [
        Some(trimmed.to_string()),
        brace_span(trimmed).map(str::to_string),
        Some(strip_code_fences(trimmed)),
    ];
    candidates
        .into_iter()
        .flatten()
        .filter_map(|candidate| serde_json::from_str::<Value>(&candidate).ok())
        .find(Value::is_object)
}

fn brace_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if start >= end {
        return None;
    }
    Some(&raw[start..=end])
}

fn strip_code_fences(raw: &str) -> String {
    let mut text = raw.trim();
    for opener in ["```json", "```JSON", "```"] {
        if let Some(rest) = text.strip_prefix(opener) {
            text = rest;
            break;
        }
    }
    text.trim()
        .strip_suffix("```")
        .unwrap_or(text)
        .trim()
        .to_string()
}

/// Parses character content, filling in missing fields. The flag reports whether
/// any fallback value was substituted.
pub fn parse_character_content(raw: &str) -> Option<(CharacterContent, bool)> {
    let data = extract_json(raw)?;
    let mut used_fallback = false;

    let mut abilities: Vec<String> = data
        .get("abilities")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if abilities.len() != FALLBACK_ABILITIES.len() {
        used_fallback |= abilities.len() < FALLBACK_ABILITIES.len();
        abilities.truncate(FALLBACK_ABILITIES.len());
        let missing = FALLBACK_ABILITIES.len() - abilities.len();
        abilities.extend(
            FALLBACK_ABILITIES[FALLBACK_ABILITIES.len() - missing..]
                .iter()
                .map(|s| s.to_string()),
        );
    }

    let narrative = match data.get("narrative").and_then(Value::as_str) {
        Some(text) if !text.trim().is_empty() => text.to_string(),
        _ => {
            used_fallback = true;
            FALLBACK_NARRATIVE.to_string()
        }
    };

    Some((
        CharacterContent {
            abilities,
            narrative,
        },
        used_fallback,
    ))
}

fn lost_character_content() -> CharacterContent {
    CharacterContent {
        abilities: LOST_ABILITIES.iter().map(|s| s.to_string()).collect(),
        narrative: LOST_NARRATIVE.to_string(),
    }
}

#[derive(Clone)]
pub struct ContentGenerator {
    client: Arc<dyn LlmClient>,
    temperature: f32,
}

impl ContentGenerator {
    pub fn new(client: Arc<dyn LlmClient>, temperature: f32) -> Self {
        Self {
            client,
            temperature,
        }
    }

    async fn complete(&self, prompt: String) -> Result<String, LlmError> {
        self.client
            .complete(LlmRequest::new(prompt, self.temperature))
            .await
    }

    pub async fn generate_character_content(
        &self,
        name: &str,
        description: &str,
    ) -> ArenaResult<Generated<CharacterContent>> {
        let text = match self.complete(character_prompt(name, description)).await {
            Ok(text) => text,
            Err(e) => {
                error!("[generate] character generation failed: {}", e);
                return match classify_failure(&e) {
                    FailureClass::Overloaded => Err(ArenaError::Overloaded),
                    FailureClass::Unknown => Ok(Generated::Degraded(lost_character_content())),
                };
            }
        };

        info!("[generate] raw character response: {}", truncate_for_log(&text));
        match parse_character_content(&text) {
            Some((content, false)) => Ok(Generated::Fresh(content)),
            Some((content, true)) => {
                warn!("[generate] character response missing fields, using fallbacks");
                Ok(Generated::Degraded(content))
            }
            None => {
                error!("[generate] character response contained no JSON object");
                Ok(Generated::Degraded(lost_character_content()))
            }
        }
    }

    pub async fn generate_battle_narrative(
        &self,
        a: &Character,
        b: &Character,
    ) -> ArenaResult<Generated<String>> {
        match self.complete(battle_prompt(a, b)).await {
            Ok(text) if !text.trim().is_empty() => Ok(Generated::Fresh(text)),
            Ok(_) => {
                warn!("[generate] empty battle narrative for {} vs {}", a.id, b.id);
                Ok(Generated::Degraded(BATTLE_LOG_FAILURE.to_string()))
            }
            Err(e) => {
                error!("[generate] battle generation failed: {}", e);
                match classify_failure(&e) {
                    FailureClass::Overloaded => Err(ArenaError::Overloaded),
                    FailureClass::Unknown => {
                        Ok(Generated::Degraded(BATTLE_LOG_FAILURE.to_string()))
                    }
                }
            }
        }
    }

    /// Never fails; diary text is decorative
    pub async fn generate_diary_entry(&self, request: &DiaryRequest) -> Generated<String> {
        let kind = request.kind();
        match self.complete(diary_prompt(request)).await {
            Ok(text) if !text.trim().is_empty() => Generated::Fresh(text.trim().to_string()),
            Ok(_) => Generated::Degraded(diary_fallback(kind).to_string()),
            Err(e) => {
                error!("[generate] diary generation failed: {}", e);
                Generated::Degraded(diary_fallback(kind).to_string())
            }
        }
    }
}
