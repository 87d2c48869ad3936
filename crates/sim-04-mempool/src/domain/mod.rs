//! # Domain Layer - Mempool Subsystem
//!
//! Pure business logic: no I/O, no async, no locks.
//!
//! ## Components
//!
//! - `entities`: PoolEntry, TxClass, MempoolConfig
//! - `pool`: TransactionPool with per-sender nonce sequencing
//! - `services`: Replacement pricing and nonce classification rules
//! - `value_objects`: Admission, MempoolStatus, PoolSnapshot
//! - `errors`: MempoolError enumeration

pub mod entities;
pub mod errors;
pub mod pool;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use pool::*;
pub use services::*;
pub use value_objects::*;
