//! Difficulty levels and the hex-prefix predicate.
//!
//! | Level | Reward | Accepted digest prefix |
//! |-------|--------|------------------------|
//! | Easy | <= 1 | `0000[1-9ab]…` or 5+ zeros |
//! | Normal | 2 | 5+ zeros |
//! | Hard | >= 3 | `00000[1-9ab]…` or 6+ zeros |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Required hash quality for a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DifficultyLevel {
    Easy,
    Normal,
    Hard,
}

impl DifficultyLevel {
    /// Difficulty for a block whose highest transaction reward is `reward`.
    pub fn from_reward(reward: u8) -> Self {
        match reward {
            0 | 1 => Self::Easy,
            2 => Self::Normal,
            _ => Self::Hard,
        }
    }

    /// Whether the lowercase hex digest `hash` meets this level.
    pub fn is_satisfied_by(self, hash: &str) -> bool {
        let bytes = hash.as_bytes();
        let zeros = bytes.iter().take_while(|b| **b == b'0').count();
        if zeros < 4 {
            return false;
        }
        let next_is_low = bytes.get(zeros).map_or(true, |b| *b <= b'b');

        match self {
            Self::Easy => zeros > 4 || next_is_low,
            Self::Normal => zeros >= 5,
            Self::Hard => zeros > 5 || (zeros == 5 && next_is_low),
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Easy => "EASY",
            Self::Normal => "NORMAL",
            Self::Hard => "HARD",
        };
        f.write_str(name)
    }
}
