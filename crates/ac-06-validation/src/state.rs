//! Observable per-worker state.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::Serialize;

/// Where a validator worker is in its loop.
///
/// ```text
/// Idle ─► Reading ─► Validating ─┬─► Committing ─► Idle
///                                └──────────────► Idle
/// any state between messages ─► Stopped
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum ValidatorState {
    Idle = 0,
    Reading = 1,
    Validating = 2,
    Committing = 3,
    Stopped = 4,
}

impl ValidatorState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Idle,
            1 => Self::Reading,
            2 => Self::Validating,
            3 => Self::Committing,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for ValidatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "IDLE",
            Self::Reading => "READING",
            Self::Validating => "VALIDATING",
            Self::Committing => "COMMITTING",
            Self::Stopped => "STOPPED",
        };
        f.write_str(label)
    }
}

/// Lock-free cell a worker writes and observers read.
#[derive(Debug)]
pub struct StateCell(AtomicU8);

impl Default for StateCell {
    fn default() -> Self {
        Self(AtomicU8::new(ValidatorState::Idle as u8))
    }
}

impl StateCell {
    pub fn get(&self) -> ValidatorState {
        ValidatorState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, state: ValidatorState) {
        self.0.store(state as u8, Ordering::Release);
    }
}
