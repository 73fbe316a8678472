//! Date-scoped character identifiers
//!
//! A character id is `{day}_{owner}`, e.g. `2025-12-11_wS4BFaizuMaOei5meAy2uHL80Is2`.
//! The day is always recovered by taking the prefix before the first `_`.

/// Builds the composite character id for an owner on a given day
pub fn character_id(day: &str, owner: &str) -> String {
    format!("{}_{}", day, owner)
}

/// Extracts the day prefix of a character id
pub fn day_of(character_id: &str) -> Option<&str> {
    split(character_id).map(|(day, _)| day)
}

/// Extracts the owner suffix of a character id
pub fn owner_of(character_id: &str) -> Option<&str> {
    split(character_id).map(|(_, owner)| owner)
}

fn split(character_id: &str) -> Option<(&str, &str)> {
    let (day, owner) = character_id.split_once('_')?;
    if day.is_empty() || owner.is_empty() {
        return None;
    }
    Some((day, owner))
}
