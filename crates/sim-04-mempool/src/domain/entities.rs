//! Core domain entities for the Mempool subsystem.
//!
//! A pooled transaction is either *pending* (executable: its nonce continues
//! the sender's gap-free run from the on-chain nonce) or *queued* (blocked
//! behind a nonce gap).

// Re-export from shared-types for convenience
pub use shared_types::{AccountInfo, Address, Hash, SignedTransaction, U256};

use serde::{Deserialize, Serialize};

/// Arrival sequence number; lower means admitted earlier.
pub type Arrival = u64;

/// Classification of a pooled transaction.
///
/// ```text
/// on-chain nonce = 3
/// nonces:  3  4  5  _  7  8
///          └pending┘    └queued┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TxClass {
    /// Executable given the sender's current nonce.
    #[default]
    Pending,
    /// Blocked behind a nonce gap.
    Queued,
}

/// A transaction in the pool with its bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolEntry {
    /// The signed transaction.
    pub transaction: SignedTransaction,
    /// Transaction hash (unique identifier).
    pub hash: Hash,
    /// Sender address.
    pub sender: Address,
    /// Sender's nonce for this transaction.
    pub nonce: u64,
    /// Declared gas ceiling.
    pub gas_limit: u64,
    /// Order of admission.
    pub arrival: Arrival,
    /// Current classification.
    pub class: TxClass,
}

impl PoolEntry {
    /// Wraps a transaction admitted at `arrival`.
    pub fn new(transaction: SignedTransaction, arrival: Arrival) -> Self {
        Self {
            hash: transaction.hash(),
            sender: transaction.sender(),
            nonce: transaction.nonce,
            gas_limit: transaction.gas_limit,
            transaction,
            arrival,
            class: TxClass::Queued,
        }
    }

    /// Returns true if the entry is executable.
    pub fn is_pending(&self) -> bool {
        self.class == TxClass::Pending
    }

    /// Returns true if the entry waits behind a nonce gap.
    pub fn is_queued(&self) -> bool {
        self.class == TxClass::Queued
    }

    /// Price ordering key at the given base fee; `None` if it cannot pay it.
    pub fn effective_gas_price(&self, base_fee: Option<U256>) -> Option<U256> {
        self.transaction.effective_gas_price(base_fee)
    }
}

/// Mempool configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MempoolConfig {
    /// Block gas limit used for admission checks.
    pub block_gas_limit: u64,
    /// Minimum fee increase, in percent, for a same-nonce replacement.
    pub replacement_bump_percent: u64,
    /// Maximum transactions in the pool.
    pub max_transactions: usize,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            block_gas_limit: 30_000_000,
            replacement_bump_percent: 10,
            max_transactions: 5_000,
        }
    }
}

impl MempoolConfig {
    /// Creates a small config for testing.
    pub fn for_testing() -> Self {
        Self {
            max_transactions: 100,
            ..Default::default()
        }
    }
}
