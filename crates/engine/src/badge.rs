//! Badge tier derivation
//!
//! Badges are a pure function of the current streak and are never persisted,
//! so they cannot drift out of sync with the streak itself.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Badge {
    None,
    Bronze,
    Silver,
    Gold,
    Premium,
}

impl Badge {
    /// Map a current streak length to its badge tier
    pub fn for_streak(current_streak: i32) -> Badge {
        match current_streak {
            n if n >= 90 => Badge::Premium,
            n if n >= 30 => Badge::Gold,
            n if n >= 15 => Badge::Silver,
            n if n >= 7 => Badge::Bronze,
            _ => Badge::None,
        }
    }
}
