//! # Core Domain Entities
//!
//! Defines the chain entities consumed by the node's subsystems.
//!
//! ## Clusters
//!
//! - **Transactions**: `SignedTransaction`, `TransactionFee`
//! - **Blocks**: `Block`, `BlockHeader`, `BlockContext`, `Receipt`
//! - **State views**: `AccountInfo`
//! - **Direct calls**: `CallParams`, `CallOutcome`

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use sha3::{Digest, Keccak256};

// Re-export U256 from primitive-types for use across all subsystems
pub use primitive_types::U256;

// =============================================================================
// CLUSTER A: PRIMITIVES
// =============================================================================

/// A 32-byte Keccak-256 hash.
pub type Hash = [u8; 32];

/// A 65-byte recoverable ECDSA signature (r, s, v).
pub type Signature = [u8; 65];

/// A 20-byte Ethereum-style address.
pub type Address = [u8; 20];

/// The zero hash, used as the parent of a genesis block.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Gas charged for every transaction before any calldata or execution.
pub const INTRINSIC_GAS: u64 = 21_000;

/// One ether in wei.
pub const ONE_ETHER: u128 = 1_000_000_000_000_000_000;

/// Formats an address as a `0x`-prefixed hex string for logs and errors.
pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address))
}

/// Formats a hash as a `0x`-prefixed hex string for logs and errors.
pub fn format_hash(hash: &Hash) -> String {
    format!("0x{}", hex::encode(hash))
}

fn u256_bytes(value: &U256) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    bytes
}

// =============================================================================
// CLUSTER B: TRANSACTIONS
// =============================================================================

/// Fee fields of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TransactionFee {
    /// Pre-fee-market pricing: a single gas price.
    Legacy {
        /// Price paid per unit of gas.
        gas_price: U256,
    },
    /// Fee-market pricing: base fee is burned, priority fee goes to the coinbase.
    FeeMarket {
        /// Upper bound on (base fee + priority fee) per unit of gas.
        max_fee_per_gas: U256,
        /// Upper bound on the tip paid to the block producer per unit of gas.
        max_priority_fee_per_gas: U256,
    },
}

/// A signed transaction as submitted by a client.
///
/// Immutable once constructed: the hash is computed from its content and the
/// pool uses it as the transaction's identity.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// Sender address (recovered from the signature upstream).
    pub from: Address,
    /// Recipient address (`None` for contract creation).
    pub to: Option<Address>,
    /// Value transferred in wei.
    pub value: U256,
    /// Sender's nonce.
    pub nonce: u64,
    /// Declared gas ceiling.
    pub gas_limit: u64,
    /// Pricing fields.
    pub fee: TransactionFee,
    /// Call data.
    pub data: Vec<u8>,
    /// Signature over the payload.
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

impl SignedTransaction {
    /// Compute the transaction hash.
    pub fn hash(&self) -> Hash {
        let mut hasher = Keccak256::new();
        hasher.update(self.from);
        match &self.to {
            Some(to) => {
                hasher.update([1u8]);
                hasher.update(to);
            }
            None => hasher.update([0u8]),
        }
        hasher.update(u256_bytes(&self.value));
        hasher.update(self.nonce.to_be_bytes());
        hasher.update(self.gas_limit.to_be_bytes());
        match &self.fee {
            TransactionFee::Legacy { gas_price } => {
                hasher.update([0u8]);
                hasher.update(u256_bytes(gas_price));
            }
            TransactionFee::FeeMarket {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => {
                hasher.update([2u8]);
                hasher.update(u256_bytes(max_fee_per_gas));
                hasher.update(u256_bytes(max_priority_fee_per_gas));
            }
        }
        hasher.update(&self.data);
        hasher.update(self.signature);
        hasher.finalize().into()
    }

    /// Returns the sender address.
    pub fn sender(&self) -> Address {
        self.from
    }

    /// Returns true for fee-market (base fee + priority fee) transactions.
    pub fn is_fee_market(&self) -> bool {
        matches!(self.fee, TransactionFee::FeeMarket { .. })
    }

    /// The most the sender can pay per unit of gas.
    pub fn max_fee_per_gas(&self) -> U256 {
        match self.fee {
            TransactionFee::Legacy { gas_price } => gas_price,
            TransactionFee::FeeMarket {
                max_fee_per_gas, ..
            } => max_fee_per_gas,
        }
    }

    /// The most the sender is willing to tip per unit of gas.
    pub fn max_priority_fee_per_gas(&self) -> U256 {
        match self.fee {
            TransactionFee::Legacy { gas_price } => gas_price,
            TransactionFee::FeeMarket {
                max_priority_fee_per_gas,
                ..
            } => max_priority_fee_per_gas,
        }
    }

    /// Price actually paid per unit of gas in a block with the given base fee.
    ///
    /// Returns `None` when the transaction cannot pay the base fee.
    pub fn effective_gas_price(&self, base_fee: Option<U256>) -> Option<U256> {
        let base_fee = match base_fee {
            None => return Some(self.max_fee_per_gas()),
            Some(base_fee) => base_fee,
        };

        match self.fee {
            TransactionFee::Legacy { gas_price } => (gas_price >= base_fee).then_some(gas_price),
            TransactionFee::FeeMarket {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => {
                if max_fee_per_gas < base_fee {
                    return None;
                }
                let tip = std::cmp::min(max_priority_fee_per_gas, max_fee_per_gas - base_fee);
                Some(base_fee + tip)
            }
        }
    }

    /// Portion of the effective gas price credited to the block producer.
    pub fn priority_fee_per_gas(&self, base_fee: Option<U256>) -> Option<U256> {
        let effective = self.effective_gas_price(base_fee)?;
        Some(effective - base_fee.unwrap_or_default())
    }

    /// Worst-case cost: value plus the full gas limit at the maximum fee.
    pub fn max_cost(&self) -> U256 {
        self.value
            .saturating_add(self.max_fee_per_gas().saturating_mul(U256::from(self.gas_limit)))
    }

    /// Gas charged before execution starts (flat cost plus calldata).
    pub fn intrinsic_gas(&self) -> u64 {
        calldata_gas(&self.data).saturating_add(INTRINSIC_GAS)
    }
}

/// Calldata cost: 16 gas per non-zero byte, 4 gas per zero byte.
pub fn calldata_gas(data: &[u8]) -> u64 {
    data.iter()
        .map(|byte| if *byte == 0 { 4u64 } else { 16u64 })
        .sum()
}

// =============================================================================
// CLUSTER C: BLOCKS
// =============================================================================

/// Header of a produced (or remotely fetched) block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    /// Block height in the chain.
    pub number: u64,
    /// Hash of the parent block.
    pub parent_hash: Hash,
    /// Unix timestamp in seconds.
    pub timestamp: u64,
    /// Gas budget of the block.
    pub gas_limit: u64,
    /// Gas actually consumed by the included transactions.
    pub gas_used: u64,
    /// Address credited with the block reward.
    pub coinbase: Address,
    /// Base fee per gas for fee-market blocks.
    pub base_fee_per_gas: Option<U256>,
    /// State root after applying the block.
    pub state_root: Hash,
    /// Commitment to the ordered transaction hashes.
    pub transactions_root: Hash,
}

impl BlockHeader {
    /// Computes the header hash.
    pub fn hash(&self) -> Hash {
        let mut hasher = Keccak256::new();
        hasher.update(self.number.to_be_bytes());
        hasher.update(self.parent_hash);
        hasher.update(self.timestamp.to_be_bytes());
        hasher.update(self.gas_limit.to_be_bytes());
        hasher.update(self.gas_used.to_be_bytes());
        hasher.update(self.coinbase);
        if let Some(base_fee) = &self.base_fee_per_gas {
            hasher.update(u256_bytes(base_fee));
        }
        hasher.update(self.state_root);
        hasher.update(self.transactions_root);
        hasher.finalize().into()
    }
}

/// A block: header plus the ordered list of included transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// The block header.
    pub header: BlockHeader,
    /// Included transactions, in execution order.
    pub transactions: Vec<SignedTransaction>,
}

impl Block {
    /// The block hash (hash of the header).
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    /// The block number.
    pub fn number(&self) -> u64 {
        self.header.number
    }

    /// Hashes of the included transactions, in order.
    pub fn transaction_hashes(&self) -> Vec<Hash> {
        self.transactions.iter().map(SignedTransaction::hash).collect()
    }
}

/// Commitment to an ordered list of transaction hashes.
pub fn transactions_root(hashes: &[Hash]) -> Hash {
    let mut hasher = Keccak256::new();
    for hash in hashes {
        hasher.update(hash);
    }
    hasher.finalize().into()
}

/// Execution context of the block a transaction or call runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockContext {
    /// Number of the block being built (or targeted by a call).
    pub number: u64,
    /// Block timestamp.
    pub timestamp: u64,
    /// Beneficiary of the block.
    pub coinbase: Address,
    /// Block gas limit.
    pub gas_limit: u64,
    /// Base fee, present for fee-market rulesets.
    pub base_fee_per_gas: Option<U256>,
}

/// Receipt of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Hash of the transaction.
    pub transaction_hash: Hash,
    /// Position of the transaction in its block.
    pub transaction_index: u64,
    /// Number of the including block.
    pub block_number: u64,
    /// Hash of the including block.
    pub block_hash: Hash,
    /// Sender.
    pub from: Address,
    /// Recipient.
    pub to: Option<Address>,
    /// Gas consumed by this transaction.
    pub gas_used: u64,
    /// Gas consumed by this and all earlier transactions of the block.
    pub cumulative_gas_used: u64,
    /// Price paid per unit of gas.
    pub effective_gas_price: U256,
    /// Whether execution succeeded.
    pub success: bool,
}

// =============================================================================
// CLUSTER D: STATE VIEWS
// =============================================================================

/// Read-only view of an account, as reported by the execution engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Next nonce the account will use.
    pub nonce: u64,
    /// Balance in wei.
    pub balance: U256,
    /// Code hash for contract accounts.
    pub code_hash: Option<Hash>,
}

// =============================================================================
// CLUSTER E: DIRECT CALLS
// =============================================================================

/// Parameters of a direct (non-mining) call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallParams {
    /// Caller; defaults to the zero address.
    pub from: Option<Address>,
    /// Target of the call.
    pub to: Option<Address>,
    /// Gas ceiling; defaults to the block gas limit.
    pub gas_limit: Option<u64>,
    /// Legacy gas price.
    pub gas_price: Option<U256>,
    /// Fee-market maximum fee per gas.
    pub max_fee_per_gas: Option<U256>,
    /// Fee-market maximum priority fee per gas.
    pub max_priority_fee_per_gas: Option<U256>,
    /// Value sent with the call.
    pub value: U256,
    /// Call data.
    pub data: Vec<u8>,
}

impl CallParams {
    /// Returns true if the call sets any fee-market parameter.
    pub fn uses_fee_market(&self) -> bool {
        self.max_fee_per_gas.is_some() || self.max_priority_fee_per_gas.is_some()
    }
}

/// Result of a direct call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallOutcome {
    /// Whether the call completed without reverting.
    pub success: bool,
    /// Gas consumed.
    pub gas_used: u64,
    /// Returned bytes (or revert data).
    pub return_data: Vec<u8>,
}
