//! Opponent selection from a day's character pool

use rand::Rng;

use crate::error::{ArenaError, ArenaResult};
use crate::models::Character;

/// Opponents required besides the requester (5 characters in total)
pub const MIN_OPPONENTS: usize = 4;

/// Picks an opponent uniformly at random, excluding every entry owned by `requester_owner`.
///
/// Duplicate entries are not collapsed; each one is an independent candidate.
pub fn select_opponent<'a, R: Rng + ?Sized>(
    pool: &'a [Character],
    requester_owner: &str,
    rng: &mut R,
) -> ArenaResult<&'a Character> {
    let candidates: Vec<&Character> = pool
        .iter()
        .filter(|c| c.owner != requester_owner)
        .collect();

    if candidates.len() < MIN_OPPONENTS {
        return Err(ArenaError::InsufficientPopulation {
            current: candidates.len() + 1,
        });
    }

    Ok(candidates[rng.gen_range(0..candidates.len())])
}
