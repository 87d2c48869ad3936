//! Time controller error types.

use thiserror::Error;

/// Errors raised when a requested block timestamp would break monotonicity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    /// The timestamp is not strictly greater than the previous block's.
    #[error("Timestamp {proposed} is lower than or equal to previous block's timestamp {previous}")]
    InvalidTimestamp {
        /// Requested timestamp
        proposed: u64,
        /// Timestamp of the latest block
        previous: u64,
    },

    /// The offset would move the clock outside the representable range.
    #[error("Time offset overflow: {offset} + {delta}")]
    OffsetOverflow {
        /// Current offset in seconds
        offset: i64,
        /// Requested change
        delta: u64,
    },
}
