//! Error types for the block builder subsystem

use shared_types::{format_address, format_hash, Address, Hash};
use sim_03_fork_source::ForkError;
use thiserror::Error;

use crate::ports::EngineError;

/// Result type alias for block building operations
pub type Result<T> = std::result::Result<T, BlockBuildError>;

/// Errors that abort a block build.
///
/// Whenever one of these is returned the engine's pending block has been
/// discarded and the pool is untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockBuildError {
    /// The engine failed while executing a transaction in a way that is not
    /// attributable to the transaction itself.
    #[error("Transaction execution failed for {} (sender {}, nonce {nonce}): {reason}", format_hash(.hash), format_address(.sender))]
    TransactionExecution {
        /// Transaction hash
        hash: Hash,
        /// Sender
        sender: Address,
        /// Nonce
        nonce: u64,
        /// Engine message
        reason: String,
    },

    /// The engine failed outside of transaction execution.
    #[error("Execution engine error while building block {block_number}: {source}")]
    Engine {
        /// Block being built
        block_number: u64,
        /// Underlying failure
        #[source]
        source: EngineError,
    },

    /// Remote fork data needed by the engine could not be fetched.
    #[error("Fork data unavailable while building block {block_number}: {source}")]
    Fork {
        /// Block being built
        block_number: u64,
        /// Underlying failure
        #[source]
        source: ForkError,
    },

    /// Gas accounting broke (internal logic error)
    #[error("Gas limit exceeded: used {used}, limit {limit}")]
    GasLimitExceeded {
        /// Gas used by the included transactions
        used: u64,
        /// Block gas limit
        limit: u64,
    },

    /// Included transactions of one sender are not sequential
    #[error("Nonce mismatch for address {}: expected {expected}, got {actual}", format_address(.address))]
    NonceMismatch {
        /// Sender
        address: Address,
        /// Expected nonce
        expected: u64,
        /// Actual nonce
        actual: u64,
    },
}

impl BlockBuildError {
    /// Wraps an engine failure outside of transaction execution, keeping
    /// fork failures typed.
    pub fn engine(block_number: u64, source: EngineError) -> Self {
        match source {
            EngineError::Fork(source) => Self::Fork {
                block_number,
                source,
            },
            source => Self::Engine {
                block_number,
                source,
            },
        }
    }

    /// Check if mining can simply be retried
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::TransactionExecution { .. })
    }

    /// Check if error points at a broken engine or builder
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            Self::GasLimitExceeded { .. } | Self::NonceMismatch { .. }
        )
    }
}
