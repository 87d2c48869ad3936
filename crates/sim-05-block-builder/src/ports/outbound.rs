//! Outbound ports (driven side - SPI)

use async_trait::async_trait;
use shared_types::{AccountInfo, Address, BlockContext, CallOutcome, CallParams, Hash, SignedTransaction, U256};
use sim_02_hardfork::Hardfork;
use sim_03_fork_source::ForkError;
use thiserror::Error;

/// Failure reported by the execution engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The transaction itself cannot be executed (bad nonce, cannot pay).
    /// Nothing was written for it.
    #[error("Transaction rejected by engine: {reason}")]
    Transaction {
        /// Engine message
        reason: String,
    },

    /// The engine is unable to continue.
    #[error("Execution engine failure: {0}")]
    Fatal(String),

    /// Remote fork data needed for execution could not be fetched.
    #[error(transparent)]
    Fork(#[from] ForkError),
}

impl EngineError {
    /// Builds a transaction-level failure.
    pub fn transaction(reason: impl Into<String>) -> Self {
        Self::Transaction {
            reason: reason.into(),
        }
    }

    /// Returns true if only the offending transaction is affected.
    pub fn is_transaction_error(&self) -> bool {
        matches!(self, Self::Transaction { .. })
    }
}

/// Result of executing one transaction inside a pending block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Gas actually consumed
    pub gas_used: u64,
    /// False if execution reverted (gas is still charged)
    pub success: bool,
}

/// Port: Execution engine owning accounts and state.
///
/// A block build opens a pending block with `begin_block`, executes
/// transactions into it, and `finalize_block` applies the reward and
/// reports the resulting state root. The caller then either commits the
/// pending writes (after the block is persisted) or discards them.
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Current committed view of an account.
    async fn get_account(&self, address: Address) -> Result<AccountInfo, EngineError>;

    /// View of an account as of the end of block `block_number`.
    async fn get_account_at(
        &self,
        address: Address,
        block_number: u64,
    ) -> Result<AccountInfo, EngineError>;

    /// Opens a pending block.
    async fn begin_block(&self, context: &BlockContext) -> Result<(), EngineError>;

    /// Executes a transaction into the pending block.
    async fn execute_transaction(
        &self,
        tx: &SignedTransaction,
        context: &BlockContext,
        hardfork: Hardfork,
    ) -> Result<ExecutionResult, EngineError>;

    /// Credits the reward and returns the pending state root.
    async fn finalize_block(&self, coinbase: Address, reward: U256) -> Result<Hash, EngineError>;

    /// Makes the pending block's writes permanent.
    async fn commit_block(&self) -> Result<(), EngineError>;

    /// Throws away the pending block's writes.
    async fn discard_block(&self);

    /// Executes a call against committed state without persisting anything.
    async fn run_call(
        &self,
        params: &CallParams,
        context: &BlockContext,
        hardfork: Hardfork,
    ) -> Result<CallOutcome, EngineError>;
}
