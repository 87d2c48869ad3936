//! Domain entities for block building

use shared_types::{Address, Block, BlockHeader, Hash, Receipt, U256};
use sim_02_hardfork::Hardfork;

/// Everything the builder needs to know about the block to build.
#[derive(Clone, Debug)]
pub struct BuildRequest {
    /// Header of the parent block.
    pub parent: BlockHeader,
    /// Timestamp of the new block.
    pub timestamp: u64,
    /// Gas budget of the new block.
    pub gas_limit: u64,
    /// Beneficiary of the reward.
    pub coinbase: Address,
    /// Ruleset the block executes under.
    pub hardfork: Hardfork,
    /// One-shot base fee chosen by the caller.
    pub base_fee_override: Option<U256>,
}

impl BuildRequest {
    /// Number of the block being built.
    pub fn number(&self) -> u64 {
        self.parent.number + 1
    }
}

/// Why a candidate was left in the pool for this block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Declared gas limit exceeds the remaining budget.
    ExceedsRemainingGas {
        /// Declared gas limit
        gas_limit: u64,
        /// Budget left at selection time
        remaining: u64,
    },
    /// Max fee per gas is below the block's base fee.
    BelowBaseFee,
}

/// A candidate left in the pool untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedTransaction {
    /// Transaction hash
    pub hash: Hash,
    /// Sender
    pub sender: Address,
    /// Reason
    pub reason: SkipReason,
}

/// A transaction the engine refused to execute; it must leave the pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DroppedTransaction {
    /// Transaction hash
    pub hash: Hash,
    /// Sender
    pub sender: Address,
    /// Nonce
    pub nonce: u64,
    /// Engine message
    pub reason: String,
}

/// Result of a successful build.
///
/// Nothing is committed yet: the caller persists `block` and `receipts`,
/// commits the engine's pending block, and then updates the pool with
/// `included` and `dropped`.
#[derive(Clone, Debug)]
pub struct BuildOutcome {
    /// The sealed block.
    pub block: Block,
    /// One receipt per included transaction, in block order.
    pub receipts: Vec<Receipt>,
    /// Candidates the engine rejected.
    pub dropped: Vec<DroppedTransaction>,
    /// Candidates left in the pool for a later block.
    pub skipped: Vec<SkippedTransaction>,
    /// Amount credited to the coinbase.
    pub reward: U256,
    /// Amount burned through the base fee.
    pub burned: U256,
}

impl BuildOutcome {
    /// Hashes of the included transactions, in block order.
    pub fn included(&self) -> Vec<Hash> {
        self.block.transaction_hashes()
    }

    /// Hashes of the dropped transactions.
    pub fn dropped_hashes(&self) -> Vec<Hash> {
        self.dropped.iter().map(|d| d.hash).collect()
    }
}
