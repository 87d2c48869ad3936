//! Node error type.

use shared_types::StoreError;
use sim_01_time_control::TimeError;
use sim_02_hardfork::HardforkError;
use sim_03_fork_source::ForkError;
use sim_04_mempool::MempoolError;
use sim_05_block_builder::{BlockBuildError, EngineError};
use thiserror::Error;

use crate::container::ConfigError;

/// Errors returned by node operations.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Transaction admission failed.
    #[error(transparent)]
    Mempool(#[from] MempoolError),

    /// Block building failed.
    #[error(transparent)]
    Build(BlockBuildError),

    /// Timestamp request rejected.
    #[error(transparent)]
    Time(#[from] TimeError),

    /// Ruleset resolution failed.
    #[error(transparent)]
    Hardfork(#[from] HardforkError),

    /// Remote fork data unavailable.
    #[error(transparent)]
    Fork(#[from] ForkError),

    /// Execution engine failure outside of a block build.
    #[error(transparent)]
    Engine(EngineError),

    /// Blockchain store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The requested block does not exist yet.
    #[error("Block {requested} not found, latest block is {latest}")]
    BlockNotFound {
        /// Requested block number
        requested: u64,
        /// Latest block number
        latest: u64,
    },

    /// The remote chain does not have the pinned fork block.
    #[error("Fork block {0} not found on the remote chain")]
    ForkBlockNotFound(u64),

    /// Zero gas limit.
    #[error("Block gas limit must be greater than zero")]
    InvalidGasLimit,
}

// Fork failures surface as `NodeError::Fork` whichever layer hit them.
impl From<EngineError> for NodeError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Fork(source) => Self::Fork(source),
            other => Self::Engine(other),
        }
    }
}

impl From<BlockBuildError> for NodeError {
    fn from(err: BlockBuildError) -> Self {
        match err {
            BlockBuildError::Fork { source, .. } => Self::Fork(source),
            other => Self::Build(other),
        }
    }
}
