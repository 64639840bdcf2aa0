//! Streak recomputation
//!
//! Pure functions over a user's sorted active-day list. A day is "active"
//! when its ledger entry has at least one solve or a consumed freeze; the
//! store filters that before we get here.
//!
//! The streak only breaks once a full day passes with no activity: a run
//! ending yesterday still reads as intact today, but a run ending two or
//! more days ago reads as 0 without any write taking place.

use common::models::StreakState;
use common::DayKey;

/// Result of walking the ledger, written back as the cached [`StreakState`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakComputation {
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_active_day: Option<DayKey>,
    pub today_solved: bool,
}

impl StreakComputation {
    pub fn zero() -> Self {
        Self {
            current_streak: 0,
            longest_streak: 0,
            last_active_day: None,
            today_solved: false,
        }
    }
}

/// Recompute streak state from the full active-day history.
///
/// `active_days` must be ascending and de-duplicated (one key per day, which
/// the ledger's (user, day) uniqueness already guarantees). `prior_longest`
/// keeps the longest streak monotonic across recomputations.
pub fn recompute(active_days: &[DayKey], today: DayKey, prior_longest: i32) -> StreakComputation {
    let Some(&last) = active_days.last() else {
        return StreakComputation {
            longest_streak: prior_longest,
            ..StreakComputation::zero()
        };
    };

    // One pass: track the trailing run length, remember the longest run seen.
    let mut longest = prior_longest;
    let mut run = 0;
    let mut prev: Option<DayKey> = None;
    for &day in active_days {
        run = match prev {
            Some(p) if DayKey::is_consecutive(p, day) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(day);
    }

    let today_solved = last == today;

    // The trailing run counts as current only while it ends at today or
    // yesterday; anything older is a broken streak.
    if DayKey::days_between(last, today) <= 1 {
        StreakComputation {
            current_streak: run,
            longest_streak: longest,
            last_active_day: Some(last),
            today_solved,
        }
    } else {
        StreakComputation {
            current_streak: 0,
            longest_streak: longest,
            last_active_day: None,
            today_solved: false,
        }
    }
}

/// Read-time view of a cached state: the stored `current_streak` is only
/// valid while its run still ends at today or yesterday. Returns
/// `(current_streak, today_solved)` as of `today` without touching storage.
pub fn observe(state: &StreakState, today: DayKey) -> (i32, bool) {
    match state.last_active_day {
        Some(last) if last == today => (state.current_streak, true),
        Some(last) if DayKey::is_consecutive(last, today) => (state.current_streak, false),
        _ => (0, false),
    }
}
