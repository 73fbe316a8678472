//! Single source of "now" for the whole arena
//!
//! Every day boundary is the UTC date, formatted `YYYY-MM-DD`.

use chrono::{DateTime, NaiveDate, Utc};

pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Upper bound for day listings
pub const MAX_RECENT_DAYS: usize = 366;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Current UTC calendar day as `YYYY-MM-DD`
    fn today(&self) -> String {
        format_day(&self.now())
    }
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Pins the clock to noon UTC of `day` (`YYYY-MM-DD`)
    pub fn at_day(day: &str) -> Result<Self, String> {
        let date = NaiveDate::parse_from_str(day, DAY_FORMAT)
            .map_err(|e| format!("Invalid day '{}': {}", day, e))?;
        let instant = date
            .and_hms_opt(12, 0, 0)
            .ok_or_else(|| format!("Invalid day '{}'", day))?
            .and_utc();
        Ok(Self(instant))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn format_day(instant: &DateTime<Utc>) -> String {
    instant.format(DAY_FORMAT).to_string()
}

/// The `count` most recent days ending at `today`, newest first.
///
/// At most `MAX_RECENT_DAYS`; stops early at the start of the calendar range.
pub fn recent_days(clock: &dyn Clock, count: usize) -> Vec<String> {
    let now = clock.now();
    (0..count.min(MAX_RECENT_DAYS) as i64)
        .map_while(|offset| now.checked_sub_signed(chrono::Duration::days(offset)))
        .map(|day| format_day(&day))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn today_uses_utc_date() {
        // 23:30 UTC stays on the same UTC day regardless of local offsets
        let clock = FixedClock(Utc.with_ymd_and_hms(2025, 1, 1, 23, 30, 0).unwrap());
        assert_eq!(clock.today(), "2025-01-01");
    }

    #[test]
    fn at_day_pins_the_given_day() {
        let clock = FixedClock::at_day("2025-06-01").unwrap();
        assert_eq!(clock.today(), "2025-06-01");
        assert!(FixedClock::at_day("June 1st").is_err());
    }

    #[test]
    fn recent_days_walks_backwards() {
        let clock = FixedClock::at_day("2025-03-02").unwrap();
        assert_eq!(
            recent_days(&clock, 3),
            vec!["2025-03-02", "2025-03-01", "2025-02-28"]
        );
    }

    #[test]
    fn recent_days_is_bounded() {
        let clock = FixedClock::at_day("2025-03-02").unwrap();
        assert_eq!(recent_days(&clock, usize::MAX).len(), MAX_RECENT_DAYS);

        let earliest = FixedClock(DateTime::<Utc>::MIN_UTC);
        assert_eq!(recent_days(&earliest, 5).len(), 1);
    }
}
