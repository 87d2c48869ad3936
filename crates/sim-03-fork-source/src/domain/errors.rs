//! Fork data source error types.

use thiserror::Error;

/// Failure reported by a remote provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ProviderFailure(pub String);

impl ProviderFailure {
    /// Creates a failure from any message.
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Errors raised while serving forked chain data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForkError {
    /// The remote provider failed; never replaced by a default value.
    #[error("Remote provider error in {method}: {reason}")]
    Provider {
        /// Remote method that failed
        method: String,
        /// Provider message
        reason: String,
    },

    /// The configured fork block does not exist on the remote chain yet.
    #[error("Trying to initialize a provider with block {requested} but the current block is {latest}")]
    InvalidForkBlock {
        /// Configured fork block
        requested: u64,
        /// Remote chain head
        latest: u64,
    },

    /// Data above the pinned block is owned by the local chain.
    #[error("{method} requested block {block_number}, above fork block {fork_block_number}")]
    BlockAboveFork {
        /// Requested method
        method: String,
        /// Requested block
        block_number: u64,
        /// Pinned fork block
        fork_block_number: u64,
    },

    /// The disk cache could not be read or written.
    #[error("Fork cache error: {0}")]
    Cache(String),
}

impl ForkError {
    pub(crate) fn provider(method: &str, failure: ProviderFailure) -> Self {
        Self::Provider {
            method: method.to_string(),
            reason: failure.0,
        }
    }
}
