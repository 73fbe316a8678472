//! Prompt templates for character, battle and diary generation

use crate::generator::DiaryRequest;
use crate::models::Character;

/// Fallback sentence used when a character has no narrative on record
const MISSING_INFO: &str = "정보 없음";

pub fn character_prompt(name: &str, description: &str) -> String {
    format!(
        r#"당신은 판타지/SF 롤플레잉 게임의 창작 작가입니다.
다음 입력을 바탕으로 캐릭터 프로필을 생성하세요:

이름: {name}
설명/컨셉: {description}

반드시 JSON 형식으로만 출력하세요. 다른 텍스트는 절대 추가하지 마세요.
JSON 형식:
{{
  "abilities": ["능력명: 간단한 설명", "능력명: 간단한 설명"],
  "narrative": "300-400자의 매력적인 캐릭터 소개 (소설의 한 장면처럼)"
}}

중요:
- abilities 배열에 정확히 2개의 특수 능력 포함
- narrative는 한국어로 작성, {name}이 주인공인 것처럼
- JSON만 출력, 설명이나 마크다운 없이"#
    )
}

fn describe_combatant(label: &str, character: &Character) -> String {
    let narrative = if character.narrative.trim().is_empty() {
        MISSING_INFO
    } else {
        character.narrative.as_str()
    };
    format!(
        "캐릭터 {label}: {} - {}\n배경 이야기 {label}: {}\n능력 {label}: {}",
        character.name,
        character.description,
        narrative,
        character.abilities.join(", ")
    )
}

pub fn battle_prompt(a: &Character, b: &Character) -> String {
    format!(
        r#"두 캐릭터 간의 상세한 배틀 로그를 작성하세요. 판타지/SF 배경입니다.

{}

{}

요구사항:
- 길이: 약 2000자 (한국어)
- 형식: 자주 문단을 나누세요. 대사는 "> "로 시작하세요. 능력 사용 시 **능력명** 강조
- 톤: 긴박하고, 극적이며, 상세하게
- 결과: 능력과 설명을 논리적으로 분석하여 승자 결정
- 구조: 조우 → 능력 충돌 → 클라이맥스 → 결말

한국어로만 작성하세요."#,
        describe_combatant("A", a),
        describe_combatant("B", b)
    )
}

pub fn diary_prompt(request: &DiaryRequest) -> String {
    match request {
        DiaryRequest::Character { name, description } => format!(
            r#"방금 사용자가 생성한 캐릭터 "{name}"에 대한 핵심 요약을 작성해주세요.
캐릭터 설명: {description}

요구사항:
- 창작자(사용자)가 캐릭터를 분석하고 기록하는 톤.
- 캐릭터의 외형, 성격, 능력의 특징을 상세하게 서술.
- 단순한 나열보다는 캐릭터의 매력이 드러나도록 작성.
- 5~6문장 이상의 상세한 분량.

한국어로 작성하세요."#
        ),
        DiaryRequest::Battle {
            name,
            opponent_name,
            battle_log,
        } => {
            let battle_log = if battle_log.trim().is_empty() {
                "기록 없음"
            } else {
                battle_log.as_str()
            };
            format!(
                r#"다음은 "{name}"(이)가 "{opponent_name}"와(과) 벌인 전투 기록입니다:

---
{battle_log}
---

위 전투 내용을 바탕으로, "{name}"의 입장에서 쓴 짧은 일기를 작성해주세요.

요구사항:
- 전투의 흐름(상대의 공격 방식, 나의 대응, 결정타 등)을 객관적으로 묘사할 것.
- 그 위에 캐릭터의 1인칭 감상과 승패에 대한 소회를 덧붙일 것.
- "그와의 대결은..." 처럼 회상하는 어조.
- 5~6문장의 생생한 문체.

한국어로 작성하세요."#
            )
        }
    }
}
