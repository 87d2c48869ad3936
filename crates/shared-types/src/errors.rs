//! # Error Types
//!
//! Defines error types shared across subsystems.

use thiserror::Error;

/// Errors that can occur in the Blockchain Store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Block not found in storage.
    #[error("Block not found: {0}")]
    NotFound(u64),

    /// The block does not extend the current tip.
    #[error("Block {number} does not extend the chain tip {latest}")]
    NonSequentialBlock { number: u64, latest: u64 },

    /// Storage backend failure.
    #[error("Storage error: {0}")]
    Backend(String),
}
