//! # Hardfork Subsystem
//!
//! Selects the protocol ruleset a block or call executes under.
//!
//! ## Resolution
//!
//! ```text
//! block >= local start (fork block + 1, or 0) ──→ configured hardfork
//! block <= fork block ──→ chain activation history
//!                          ├─ no history ──→ UnknownHistoricalHardfork
//!                          └─ greatest activation <= block
//! ```
//!
//! Ruleset names are parsed into the closed [`Hardfork`] enum when the
//! configuration is loaded, so an unknown name fails at startup rather than
//! when a historical block is first queried.

pub mod config;
pub mod domain;

pub use config::{ChainConfig, MAINNET_CHAIN_ID};
pub use domain::*;
