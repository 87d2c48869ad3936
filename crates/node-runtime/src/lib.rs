//! # Node Runtime Library
//!
//! The simulated node and the in-memory adapters it runs on. The `main.rs`
//! binary runs a standalone node; tests and embedders use [`Node`] directly.
//!
//! ## Node-Level Operations
//!
//! | Operation | Effect |
//! |-----------|--------|
//! | `send_transaction` | Admits a transaction into the pool |
//! | `mine_block` | Builds, persists and commits one block |
//! | `get_pending_transactions` | Pooled transactions in arrival order |
//! | `get_transaction_receipt` | Local receipt, or remote when forked |
//! | `get_account_balance(_at)` | Balance now or at a past block |
//! | `get_block_by_number` | Remote up to the fork block, local after |
//! | `set_block_gas_limit` | Gas budget of future blocks |
//! | `set_next_block_timestamp` / `increase_time` | Block time control |
//! | `run_call` | Call under the targeted block's ruleset |
//!
//! ## Architecture
//!
//! - **Hexagonal Architecture**: the node consumes `ExecutionEngine` and
//!   `BlockchainStore` ports; `adapters/` holds in-memory implementations
//! - **Single control point**: all mutable state sits in one lock owned by
//!   the node, so mining requests are serialized

#![warn(missing_docs)]

pub mod adapters;
pub mod container;
pub mod error;
pub mod genesis;
pub mod node;
pub mod ports;

pub use container::{ConfigError, NodeConfig};
pub use error::NodeError;
pub use node::{Node, NodeSnapshot};
pub use ports::BlockchainStore;
