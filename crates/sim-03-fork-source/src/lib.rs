//! # Fork Data Source Subsystem
//!
//! Serves historical data of a remote chain pinned at a fork block.
//!
//! ## Flow
//!
//! ```text
//! query(method, args) ──→ ForkCache (memory, then disk)
//!                            │ hit ──→ response
//!                            │ miss
//!                            ↓
//!                       RemoteProvider ──→ store ──→ response
//! ```
//!
//! Queries above the fork block are refused: past the fork point the local
//! chain owns the data. Provider failures surface as `ForkError::Provider`
//! and are never retried or replaced by defaults.
//!
//! ## Module Structure
//!
//! ```text
//! ports/outbound.rs      - RemoteProvider trait, method names
//! adapters/in_memory.rs  - InMemoryRemoteProvider
//! domain/cache.rs        - CacheKey, ForkCache
//! domain/errors.rs       - ForkError
//! config.rs              - ForkConfig, safe depth, recommended fork block
//! service.rs             - ForkDataSource
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::InMemoryRemoteProvider;
pub use config::{recommended_fork_block_number, safe_block_depth, ForkConfig};
pub use domain::*;
pub use ports::{methods, RemoteProvider};
pub use service::ForkDataSource;
