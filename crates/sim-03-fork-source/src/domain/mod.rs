//! # Domain Layer - Fork Data Source
//!
//! - `cache`: CacheKey, ForkCache (memory + optional disk)
//! - `errors`: ForkError, ProviderFailure

pub mod cache;
pub mod errors;

pub use cache::*;
pub use errors::*;
