//! The two independent clocks that drive the proposal lifecycle.
//!
//! Voting windows are measured in block heights; the timelock and grace
//! period are measured in wall-clock seconds. Every operation receives the
//! caller's current [`Clock`] — nothing is scheduled asynchronously, and all
//! time-based transitions are recomputed lazily from the clock on each call.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A block height on the underlying ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockHeight(u64);

impl BlockHeight {
    pub const GENESIS: Self = Self(0);

    pub fn new(height: u64) -> Self {
        Self(height)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// The height `blocks` after this one.
    pub fn offset(self, blocks: u64) -> Self {
        Self(self.0.saturating_add(blocks))
    }

    /// The immediately preceding height (saturating at genesis).
    pub fn prev(self) -> Self {
        Self(self.0.saturating_sub(1))
    }
}

impl fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Time zero — also the "not yet queued" sentinel for a proposal's eta.
    pub const EPOCH: Self = Self(0);

    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// Get the current system time as a `Timestamp`.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before Unix epoch")
            .as_secs();
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// The timestamp `secs` after this one.
    pub fn offset(self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// Whether this timestamp + duration has passed relative to `now`.
    pub fn has_expired(&self, duration_secs: u64, now: Timestamp) -> bool {
        now.0 >= self.0.saturating_add(duration_secs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// The caller's view of both clocks at the moment of an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clock {
    pub height: BlockHeight,
    pub time: Timestamp,
}

impl Clock {
    pub fn new(height: BlockHeight, time: Timestamp) -> Self {
        Self { height, time }
    }

    /// Convenience constructor from raw values.
    pub fn at(height: u64, secs: u64) -> Self {
        Self {
            height: BlockHeight::new(height),
            time: Timestamp::new(secs),
        }
    }
}
