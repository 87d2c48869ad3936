//! Mempool error types.
//!
//! Admission errors are returned synchronously and never leave the pool
//! partially mutated.

use shared_types::{format_address, format_hash};
use thiserror::Error;

use super::entities::{Address, Hash, U256};

/// Mempool error type.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MempoolError {
    /// Transaction already exists in the pool.
    #[error("Known transaction: {}", format_hash(.0))]
    AlreadyKnown(Hash),

    /// The nonce was already used on chain.
    #[error("Nonce too low for {}: expected nonce {expected}, got {actual}", format_address(.sender))]
    NonceTooLow {
        /// Sender
        sender: Address,
        /// Sender's on-chain nonce
        expected: u64,
        /// Transaction nonce
        actual: u64,
    },

    /// The transaction could never fit in a block.
    #[error("Transaction {} gas limit is {gas_limit} and exceeds block gas limit of {block_gas_limit}", format_hash(.hash))]
    GasLimitExceedsBlockLimit {
        /// Transaction hash
        hash: Hash,
        /// Declared gas limit
        gas_limit: u64,
        /// Configured block gas limit
        block_gas_limit: u64,
    },

    /// The gas limit does not cover the intrinsic cost.
    #[error("Transaction {} requires at least {intrinsic} gas but got {gas_limit}", format_hash(.hash))]
    IntrinsicGasTooLow {
        /// Transaction hash
        hash: Hash,
        /// Declared gas limit
        gas_limit: u64,
        /// Flat plus calldata cost
        intrinsic: u64,
    },

    /// The sender cannot pay for value plus gas at the maximum fee.
    #[error("Sender {} doesn't have enough funds to send tx. The max upfront cost is: {required} and the sender's balance is: {available}", format_address(.sender))]
    InsufficientFunds {
        /// Sender
        sender: Address,
        /// Value plus gas limit times max fee
        required: U256,
        /// Sender's balance
        available: U256,
    },

    /// Same-nonce replacement without the required fee bump.
    #[error("Replacement transaction underpriced: {old_price} -> {new_price} (min bump {min_bump_percent}%)")]
    ReplacementUnderpriced {
        /// Hash of the pooled transaction
        existing: Hash,
        /// Pooled max fee per gas
        old_price: U256,
        /// Offered max fee per gas
        new_price: U256,
        /// Required bump
        min_bump_percent: u64,
    },

    /// Pool has reached maximum capacity.
    #[error("Pool full at {capacity} transactions")]
    PoolFull {
        /// Configured capacity
        capacity: usize,
    },

    /// Transaction not found in the pool.
    #[error("Transaction not found: {}", format_hash(.0))]
    TransactionNotFound(Hash),
}

impl MempoolError {
    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::AlreadyKnown(_) => "already_known",
            Self::NonceTooLow { .. } => "nonce_too_low",
            Self::GasLimitExceedsBlockLimit { .. } => "gas_limit_exceeded",
            Self::IntrinsicGasTooLow { .. } => "intrinsic_gas_too_low",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::ReplacementUnderpriced { .. } => "replacement_underpriced",
            Self::PoolFull { .. } => "pool_full",
            Self::TransactionNotFound(_) => "not_found",
        }
    }
}
