//! Block timestamp computation.
//!
//! Timestamps come from three sources, in priority order:
//!
//! 1. An explicit timestamp supplied with the mine request
//! 2. A one-shot override set via `set_next_timestamp`
//! 3. The wall clock shifted by the accumulated offset
//!
//! Consuming an override rebases the offset on it, so automatic timestamps
//! keep ticking from the override instead of jumping back to wall-clock time.
//! Whatever the source, the result is strictly greater than the previous
//! block's timestamp.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::errors::TimeError;
use crate::ports::Clock;

/// Where a planned block timestamp came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimestampSource {
    /// Supplied by the caller for this block only.
    Explicit,
    /// The pending one-shot override.
    Override,
    /// Wall clock plus offset.
    Automatic,
    /// Wall clock plus offset would not advance; previous + 1 was used.
    MonotonicStep,
}

/// A planned timestamp and the state change that applying it implies.
///
/// Planning is side-effect free; the controller only changes once the block
/// using this timestamp has actually been produced (see [`TimeController::commit`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampDecision {
    /// Timestamp for the next block.
    pub timestamp: u64,
    /// Source of the timestamp.
    pub source: TimestampSource,
    new_offset: Option<i64>,
}

/// Snapshot of the controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeState {
    /// Seconds added to the wall clock for automatic timestamps.
    pub offset_seconds: i64,
    /// Pending one-shot override.
    pub next_block_timestamp: Option<u64>,
}

/// Tracks the wall-clock offset and the one-shot timestamp override.
pub struct TimeController {
    clock: Arc<dyn Clock>,
    offset_seconds: i64,
    next_block_timestamp: Option<u64>,
}

fn to_signed(seconds: u64) -> i64 {
    i64::try_from(seconds).unwrap_or(i64::MAX)
}

impl TimeController {
    /// Creates a controller with a zero offset.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            offset_seconds: 0,
            next_block_timestamp: None,
        }
    }

    /// Creates a controller whose automatic timestamps start at `initial_timestamp`.
    pub fn with_initial_timestamp(clock: Arc<dyn Clock>, initial_timestamp: u64) -> Self {
        let offset_seconds = to_signed(initial_timestamp) - to_signed(clock.now_seconds());
        Self {
            clock,
            offset_seconds,
            next_block_timestamp: None,
        }
    }

    /// Current wall-clock time, in seconds.
    pub fn now(&self) -> u64 {
        self.clock.now_seconds()
    }

    /// Accumulated offset in seconds.
    pub fn offset_seconds(&self) -> i64 {
        self.offset_seconds
    }

    /// Pending one-shot override, if any.
    pub fn next_block_timestamp(&self) -> Option<u64> {
        self.next_block_timestamp
    }

    /// Returns a copy of the controller state.
    pub fn state(&self) -> TimeState {
        TimeState {
            offset_seconds: self.offset_seconds,
            next_block_timestamp: self.next_block_timestamp,
        }
    }

    /// Computes the timestamp for the block following one stamped `previous`.
    ///
    /// An explicit timestamp is used verbatim and leaves the offset and the
    /// override untouched; it must still be strictly greater than `previous`.
    pub fn plan_next_timestamp(
        &self,
        explicit: Option<u64>,
        previous: u64,
    ) -> Result<TimestampDecision, TimeError> {
        if let Some(timestamp) = explicit {
            if timestamp <= previous {
                return Err(TimeError::InvalidTimestamp {
                    proposed: timestamp,
                    previous,
                });
            }
            return Ok(TimestampDecision {
                timestamp,
                source: TimestampSource::Explicit,
                new_offset: None,
            });
        }

        let now = to_signed(self.clock.now_seconds());

        if let Some(preset) = self.next_block_timestamp {
            // A block mined with an explicit timestamp may have overtaken the preset.
            let timestamp = preset.max(previous.saturating_add(1));
            return Ok(TimestampDecision {
                timestamp,
                source: TimestampSource::Override,
                new_offset: Some(to_signed(timestamp) - now),
            });
        }

        let candidate = now.saturating_add(self.offset_seconds);
        if candidate <= to_signed(previous) {
            return Ok(TimestampDecision {
                timestamp: previous.saturating_add(1),
                source: TimestampSource::MonotonicStep,
                new_offset: None,
            });
        }

        Ok(TimestampDecision {
            // candidate > previous >= 0
            timestamp: candidate as u64,
            source: TimestampSource::Automatic,
            new_offset: None,
        })
    }

    /// Applies a decision once its block has been produced: clears a consumed
    /// override and rebases the offset on it.
    pub fn commit(&mut self, decision: &TimestampDecision) {
        if decision.source == TimestampSource::Override {
            self.next_block_timestamp = None;
        }
        if let Some(offset) = decision.new_offset {
            debug!(
                timestamp = decision.timestamp,
                old_offset = self.offset_seconds,
                new_offset = offset,
                "Timestamp override consumed, offset rebased"
            );
            self.offset_seconds = offset;
        }
    }

    /// Plans and immediately commits the next timestamp.
    pub fn next_timestamp(&mut self, explicit: Option<u64>, previous: u64) -> Result<u64, TimeError> {
        let decision = self.plan_next_timestamp(explicit, previous)?;
        self.commit(&decision);
        Ok(decision.timestamp)
    }

    /// Adds `seconds` to the offset; returns the new offset.
    pub fn advance_time(&mut self, seconds: u64) -> Result<i64, TimeError> {
        let offset = i64::try_from(seconds)
            .ok()
            .and_then(|delta| self.offset_seconds.checked_add(delta))
            .ok_or(TimeError::OffsetOverflow {
                offset: self.offset_seconds,
                delta: seconds,
            })?;
        self.offset_seconds = offset;
        debug!(seconds, offset, "Time advanced");
        Ok(offset)
    }

    /// Sets the timestamp of the next automatically stamped block.
    pub fn set_next_timestamp(&mut self, timestamp: u64, previous: u64) -> Result<(), TimeError> {
        if timestamp <= previous {
            return Err(TimeError::InvalidTimestamp {
                proposed: timestamp,
                previous,
            });
        }
        self.next_block_timestamp = Some(timestamp);
        debug!(timestamp, "Next block timestamp set");
        Ok(())
    }
}

impl std::fmt::Debug for TimeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeController")
            .field("offset_seconds", &self.offset_seconds)
            .field("next_block_timestamp", &self.next_block_timestamp)
            .finish()
    }
}
