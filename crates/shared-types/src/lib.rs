//! # Shared Types Crate
//!
//! This crate contains the data model shared by every subsystem of the
//! simulated node: signed transactions, blocks, receipts, account views and
//! direct-call parameters.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Immutable Payloads**: A `SignedTransaction` is never mutated after it
//!   is hashed; its hash is its content identity.
//! - **Read-Only Accounts**: `AccountInfo` is a view. Balances and nonces are
//!   owned by the execution engine and only read by the core.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
