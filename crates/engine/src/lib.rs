//! Streak computation and the service facade
//!
//! The rules that were previously duplicated across UI components live here
//! in one place: day-run arithmetic in [`streak`], badge thresholds in
//! [`badge`], and the orchestrating facade in [`service`].

pub mod badge;
pub mod service;
pub mod streak;

pub use badge::Badge;
pub use service::{CalendarDay, LeaderboardRow, StreakService, StreakSummary};
