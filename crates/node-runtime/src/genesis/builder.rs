//! # Genesis Block Builder
//!
//! Creates the genesis block for chain initialization.

use sha3::{Digest, Keccak256};
use shared_types::{transactions_root, Address, Block, BlockHeader, Hash, U256, ONE_ETHER, ZERO_HASH};
use sim_02_hardfork::Hardfork;

use crate::container::GenesisAccount;

/// Balance of each derived default account (10,000 ETH).
pub const DEFAULT_ACCOUNT_BALANCE: u128 = 10_000 * ONE_ETHER;

/// Number of default accounts funded when none are configured.
pub const DEFAULT_ACCOUNT_COUNT: usize = 10;

/// Deterministic funded accounts for a standalone chain.
///
/// Address `i` is the last 20 bytes of `keccak256("sim-chain account <i>")`.
pub fn default_accounts(count: usize) -> Vec<GenesisAccount> {
    (0..count)
        .map(|index| GenesisAccount {
            address: derive_address(format!("sim-chain account {index}").as_bytes()),
            balance: U256::from(DEFAULT_ACCOUNT_BALANCE),
        })
        .collect()
}

/// Derive an address from a seed: Keccak256, last 20 bytes.
fn derive_address(seed: &[u8]) -> Address {
    let hash = Keccak256::digest(seed);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..32]);
    address
}

/// Builder for creating genesis blocks.
#[derive(Debug, Clone)]
pub struct GenesisBuilder {
    timestamp: u64,
    gas_limit: u64,
    coinbase: Address,
    hardfork: Hardfork,
    initial_base_fee: U256,
}

impl GenesisBuilder {
    /// Create a new genesis builder.
    pub fn new(timestamp: u64, gas_limit: u64, coinbase: Address, hardfork: Hardfork) -> Self {
        Self {
            timestamp,
            gas_limit,
            coinbase,
            hardfork,
            initial_base_fee: U256::from(sim_05_block_builder::DEFAULT_INITIAL_BASE_FEE),
        }
    }

    /// Overrides the genesis base fee.
    pub fn with_initial_base_fee(mut self, fee: U256) -> Self {
        self.initial_base_fee = fee;
        self
    }

    /// Build the genesis block on top of the given state root.
    pub fn build(&self, state_root: Hash) -> Block {
        let base_fee_per_gas = self
            .hardfork
            .supports_fee_market()
            .then_some(self.initial_base_fee);

        Block {
            header: BlockHeader {
                number: 0,
                parent_hash: ZERO_HASH,
                timestamp: self.timestamp,
                gas_limit: self.gas_limit,
                gas_used: 0,
                coinbase: self.coinbase,
                base_fee_per_gas,
                state_root,
                transactions_root: transactions_root(&[]),
            },
            transactions: Vec::new(),
        }
    }
}
