//! # Node Container
//!
//! Configuration of the node and of every subsystem it wires together.

pub mod config;

pub use config::{ConfigError, GenesisAccount, MiningConfig, NodeConfig};
