//! Day-boundary visibility for the shared, day-indexed view
//!
//! Records read through the owner view are never gated.

use crate::clock::Clock;
use crate::error::{ArenaError, ArenaResult};

/// A record is visible only on the exact day it was created
pub fn is_visible(created_day: &str, today: &str) -> bool {
    created_day == today
}

/// Fails with `Expired` once the clock has moved past `created_day`
pub fn ensure_visible(created_day: &str, clock: &dyn Clock) -> ArenaResult<()> {
    if is_visible(created_day, &clock.today()) {
        Ok(())
    } else {
        Err(ArenaError::Expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    #[test]
    fn visible_only_on_creation_day() {
        assert!(is_visible("2025-01-01", "2025-01-01"));
        assert!(!is_visible("2025-01-01", "2025-01-02"));
        assert!(!is_visible("2025-01-02", "2025-01-01"));
    }

    #[test]
    fn comparison_is_plain_string_equality() {
        assert!(!is_visible("2025-1-1", "2025-01-01"));
    }

    #[test]
    fn gate_follows_the_clock() {
        let same_day = FixedClock::at_day("2025-01-01").unwrap();
        let next_day = FixedClock::at_day("2025-01-02").unwrap();

        assert!(ensure_visible("2025-01-01", &same_day).is_ok());
        assert_eq!(
            ensure_visible("2025-01-01", &next_day),
            Err(ArenaError::Expired)
        );
    }
}
