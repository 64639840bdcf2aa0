//! Day key arithmetic
//!
//! All streak rules are phrased in terms of calendar days in a single fixed
//! reference timezone (UTC). A [`DayKey`] is the number of days since the
//! Unix epoch of a timestamp's UTC calendar date, which makes "same day",
//! "yesterday" and "gap" questions plain integer arithmetic.

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical identifier for one UTC calendar day
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct DayKey(pub i64);

impl DayKey {
    /// Resolve a timestamp to its UTC calendar day
    pub fn from_timestamp(ts: DateTime<Utc>) -> Self {
        // NaiveDate::default() is 1970-01-01
        DayKey((ts.date_naive() - NaiveDate::default()).num_days())
    }

    pub fn from_date(date: NaiveDate) -> Self {
        DayKey((date - NaiveDate::default()).num_days())
    }

    /// The calendar date this key identifies
    pub fn date(self) -> NaiveDate {
        NaiveDate::default()
            .checked_add_signed(Duration::days(self.0))
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn next(self) -> Self {
        DayKey(self.0 + 1)
    }

    pub fn prev(self) -> Self {
        DayKey(self.0 - 1)
    }

    /// True when `b` is exactly one calendar day after `a`
    pub fn is_consecutive(a: DayKey, b: DayKey) -> bool {
        b.0 == a.0 + 1
    }

    pub fn days_between(a: DayKey, b: DayKey) -> i64 {
        b.0 - a.0
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date())
    }
}

/// Seconds until the end of the current UTC day, for urgency messaging
pub fn seconds_left_in_day(now: DateTime<Utc>) -> i64 {
    86_400 - i64::from(now.time().num_seconds_from_midnight())
}
