//! Up/down vote ledger entries.

use serde::{Deserialize, Serialize};

/// A single user's vote on a piece of content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Up,
    Down,
}

impl Rating {
    /// Stored column value (1 for up, 0 for down).
    pub fn as_stored(self) -> i64 {
        match self {
            Rating::Up => 1,
            Rating::Down => 0,
        }
    }

    pub fn from_stored(value: i64) -> Self {
        if value == 1 {
            Rating::Up
        } else {
            Rating::Down
        }
    }

    /// Signed form used by callers: 1, -1, or 0 for no vote.
    pub fn signum(rating: Option<Rating>) -> i8 {
        match rating {
            Some(Rating::Up) => 1,
            Some(Rating::Down) => -1,
            None => 0,
        }
    }

    /// Inverse of [`Rating::signum`]; positive is up, negative is down, zero is none.
    pub fn from_signum(value: i64) -> Option<Rating> {
        match value.signum() {
            1 => Some(Rating::Up),
            -1 => Some(Rating::Down),
            _ => None,
        }
    }
}
