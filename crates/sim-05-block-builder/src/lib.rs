//! # Block Builder Subsystem
//!
//! Assembles a block from the transaction pool's pending set under a gas
//! budget, executes it through the execution engine and settles the miner
//! reward.
//!
//! ## Selection
//!
//! Only the nonce head of each sender is a candidate. The candidate with the
//! highest effective gas price goes first; equal prices go by arrival.
//!
//! ```text
//! pending runs          heap (price, arrival)
//! A: [a0 a1 a2]   ──►   a0 ─ executed ─► a1 pushed
//! B: [b0]               b0
//! C: [c0 c1]            c0 ─ too big  ─► C blocked for this block
//! ```
//!
//! - A head whose declared gas limit exceeds the *remaining* budget is
//!   skipped and its sender contributes nothing more to this block.
//! - The budget shrinks by the gas actually used, not the declared limit.
//! - A fee-market head that cannot pay the base fee is skipped the same way.
//!
//! ## Failure Policy
//!
//! | Engine error | Effect |
//! |--------------|--------|
//! | `EngineError::Transaction` | Transaction reported as dropped, round continues |
//! | `EngineError::Fatal` | Pending block discarded, build fails, pool untouched |
//! | `EngineError::Fork` | Same as `Fatal`, reported as `BlockBuildError::Fork` |
//!
//! Dropped transactions are not retried; the caller removes them from the
//! pool and the submitter has to resubmit.
//!
//! ## Reward
//!
//! `coinbase += subsidy(hardfork) + Σ priority_fee × gas_used`. The base fee
//! portion is burned.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Domain models and business logic
pub mod domain;
/// Hexagonal architecture ports
pub mod ports;
/// Block builder service
pub mod service;

mod config;
mod error;
mod metrics;

pub use config::BuilderConfig;
pub use error::{BlockBuildError, Result};
pub use metrics::Metrics;

pub use domain::{
    calculate_block_reward, calculate_next_base_fee, BuildOutcome, BuildRequest, CandidateQueue,
    DroppedTransaction, SkipReason, SkippedTransaction,
};

pub use ports::{EngineError, ExecutionEngine, ExecutionResult};

pub use service::BlockBuilder;

/// Default block gas limit (30 million gas)
pub const DEFAULT_GAS_LIMIT: u64 = 30_000_000;

/// Base fee of the first fee-market block (1 gwei)
pub const DEFAULT_INITIAL_BASE_FEE: u64 = 1_000_000_000;
