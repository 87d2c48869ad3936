//! # Transaction Pool (Mempool) Subsystem
//!
//! Admits signed transactions, tracks per-sender nonce sequencing and
//! classifies each entry as pending or queued.
//!
//! ## Classification
//!
//! ```text
//! on-chain nonce = 3
//!
//!   nonce 3 ──┐
//!   nonce 4   ├── PENDING (gap-free run, eligible for the next block)
//!   nonce 5 ──┘
//!   nonce 7 ──┐
//!   nonce 8 ──┴── QUEUED  (blocked behind the missing nonce 6)
//! ```
//!
//! Admitting nonce 6 promotes 7 and 8. Dropping nonce 3 (failed execution)
//! demotes 4 and 5 until it is resubmitted.
//!
//! ## Admission Checks
//!
//! Checks run in order and the pool is untouched when one fails:
//!
//! | Check | Error |
//! |-------|-------|
//! | Hash already pooled | `AlreadyKnown` |
//! | Nonce below on-chain nonce | `NonceTooLow` |
//! | Gas limit above block gas limit | `GasLimitExceedsBlockLimit` |
//! | Gas limit below intrinsic gas | `IntrinsicGasTooLow` |
//! | Max cost above balance | `InsufficientFunds` |
//! | Nonce taken without fee bump | `ReplacementUnderpriced` |
//! | Pool at capacity | `PoolFull` |
//!
//! The pool does not own account state. Callers pass the execution engine's
//! `AccountInfo` view of the sender to `add`.

pub mod domain;

pub use domain::*;
