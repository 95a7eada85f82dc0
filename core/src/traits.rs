//! Core traits defining BALLOTBOX interfaces

use crate::types::Timestamp;
use parking_lot::RwLock;

/// Result type for BALLOTBOX operations
pub type BallotResult<T> = Result<T, crate::error::BallotError>;

/// Source of the current time
///
/// The ledger never reads a clock itself; hosts pass `clock.now()` into
/// every time-sensitive operation.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    pub fn set(&self, now: Timestamp) {
        *self.now.write() = now;
    }

    pub fn advance_millis(&self, millis: u64) {
        let mut now = self.now.write();
        *now = now.saturating_add_millis(millis);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.read()
    }
}
