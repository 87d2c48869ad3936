//! # Domain Layer - Time Control
//!
//! - `controller`: TimeController, TimestampDecision, TimeState
//! - `errors`: TimeError

pub mod controller;
pub mod errors;

pub use controller::*;
pub use errors::*;
