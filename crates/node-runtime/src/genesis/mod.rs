//! # Genesis Module
//!
//! Genesis block creation for a standalone chain.
//!
//! The genesis block has special properties:
//!
//! - Number: 0
//! - Parent hash: 32 zero bytes
//! - No transactions
//! - State root: the engine's root after funding the genesis accounts
//! - Base fee: the initial base fee when the ruleset has a fee market
//!
//! A forked node has no genesis: its chain starts at the pinned remote block.

pub mod builder;

pub use builder::{default_accounts, GenesisBuilder, DEFAULT_ACCOUNT_BALANCE, DEFAULT_ACCOUNT_COUNT};
