//! # Node Configuration
//!
//! Unified configuration for all subsystems and runtime parameters, loaded
//! from TOML. Every section has a default, so an empty document describes a
//! standalone London-or-later devnet.
//!
//! ```toml
//! chainId = 31337
//! hardfork = "london"
//! blockGasLimit = 30000000
//! coinbase = "0xc014ba5ec014ba5ec014ba5ec014ba5ec014ba5e"
//!
//! [[genesisAccounts]]
//! address = "0x00000000000000000000000000000000000000aa"
//! balance = "0x56bc75e2d63100000"
//!
//! [fork]
//! url = "http://localhost:8545"
//! blockNumber = 1000
//! ```

use serde::{Deserialize, Deserializer};
use shared_types::{Address, U256};
use sim_02_hardfork::{ChainConfig, Hardfork};
use sim_03_fork_source::ForkConfig;
use sim_04_mempool::MempoolConfig;
use sim_05_block_builder::{BuilderConfig, DEFAULT_GAS_LIMIT};
use thiserror::Error;

/// Chain id of a standalone node.
pub const DEFAULT_CHAIN_ID: u64 = 31_337;

/// Default block beneficiary.
pub const DEFAULT_COINBASE: Address = [
    0xc0, 0x14, 0xba, 0x5e, 0xc0, 0x14, 0xba, 0x5e, 0xc0, 0x14, 0xba, 0x5e, 0xc0, 0x14, 0xba,
    0x5e, 0xc0, 0x14, 0xba, 0x5e,
];

/// Complete node configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeConfig {
    /// Chain id of the local chain (ignored when forking: the remote id is used).
    pub chain_id: u64,
    /// Ruleset of locally produced blocks.
    pub hardfork: Hardfork,
    /// Gas budget of every block.
    pub block_gas_limit: u64,
    /// Beneficiary of block rewards.
    #[serde(deserialize_with = "deserialize_address")]
    pub coinbase: Address,
    /// Timestamp of the first local block; wall clock when unset.
    pub initial_timestamp: Option<u64>,
    /// One-shot base fee for the first mined block.
    pub next_block_base_fee: Option<U256>,
    /// Funded accounts of a standalone chain; defaults are derived when empty.
    pub genesis_accounts: Vec<GenesisAccount>,
    /// Transaction pool settings.
    pub mempool: MempoolConfig,
    /// Block builder settings.
    pub builder: BuilderConfig,
    /// Remote chain to fork from.
    pub fork: Option<ForkConfig>,
    /// Activation histories of remote chains, in addition to mainnet.
    pub chains: Vec<ChainConfig>,
    /// Automatic mining.
    pub mining: MiningConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            hardfork: Hardfork::LATEST,
            block_gas_limit: DEFAULT_GAS_LIMIT,
            coinbase: DEFAULT_COINBASE,
            initial_timestamp: None,
            next_block_base_fee: None,
            genesis_accounts: Vec::new(),
            mempool: MempoolConfig::default(),
            builder: BuilderConfig::default(),
            fork: None,
            chains: Vec::new(),
            mining: MiningConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Fails fast on settings that could never produce a working node.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_gas_limit == 0 {
            return Err(ConfigError::Invalid(
                "blockGasLimit must be greater than zero".to_string(),
            ));
        }
        if self.mempool.max_transactions == 0 {
            return Err(ConfigError::Invalid(
                "mempool.maxTransactions must be greater than zero".to_string(),
            ));
        }
        for chain in &self.chains {
            chain
                .activations()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        if matches!(self.mining.interval_secs, Some(0)) {
            return Err(ConfigError::Invalid(
                "mining.intervalSecs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Configuration for tests: fixed start time, small pool.
    pub fn for_testing() -> Self {
        Self {
            initial_timestamp: Some(1_700_000_000),
            mempool: MempoolConfig::for_testing(),
            ..Self::default()
        }
    }
}

/// A funded genesis account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenesisAccount {
    /// Account address.
    #[serde(deserialize_with = "deserialize_address")]
    pub address: Address,
    /// Initial balance in wei.
    pub balance: U256,
}

/// Mining/Block Production configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MiningConfig {
    /// Mine a block every `interval_secs`; blocks are mined on demand when unset.
    pub interval_secs: Option<u64>,
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The document is not valid TOML or has wrongly typed fields.
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// A value is out of range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Parses a `0x`-prefixed 20-byte hex address.
pub fn parse_address(value: &str) -> Result<Address, String> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    let bytes = hex::decode(digits).map_err(|e| format!("invalid address {value}: {e}"))?;
    Address::try_from(bytes.as_slice())
        .map_err(|_| format!("invalid address {value}: expected 20 bytes, got {}", bytes.len()))
}

fn deserialize_address<'de, D>(deserializer: D) -> Result<Address, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    parse_address(&value).map_err(serde::de::Error::custom)
}
