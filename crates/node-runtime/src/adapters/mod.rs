//! # Adapter Implementations
//!
//! In-memory implementations of the ports the node consumes:
//!
//! - `InMemoryBlockchain` implements the node's `BlockchainStore`
//! - `InMemoryExecutionEngine` implements the block builder's `ExecutionEngine`
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                    Node                      │
//! │   TransactionPool   TimeController   ...     │
//! └───────┬───────────────────────┬──────────────┘
//!         │ ExecutionEngine       │ BlockchainStore
//!         ↓                       ↓
//!  InMemoryExecutionEngine   InMemoryBlockchain
//!         │ (forked)
//!         ↓
//!   ForkDataSource
//! ```

pub mod blockchain;
pub mod execution;

pub use blockchain::InMemoryBlockchain;
pub use execution::InMemoryExecutionEngine;
