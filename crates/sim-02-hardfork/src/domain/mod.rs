//! # Domain Layer - Hardfork Resolution
//!
//! - `hardfork`: Hardfork enum, Feature gates, block reward schedule
//! - `activations`: HardforkActivations (validated, strictly increasing)
//! - `resolver`: HardforkResolver
//! - `errors`: HardforkError

pub mod activations;
pub mod errors;
pub mod hardfork;
pub mod resolver;

pub use activations::*;
pub use errors::*;
pub use hardfork::*;
pub use resolver::*;
