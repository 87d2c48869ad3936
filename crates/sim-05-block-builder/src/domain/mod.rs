//! Domain layer for block building
//!
//! Pure logic: candidate selection, fee-market math and block invariants.

pub mod entities;
pub mod invariants;
pub mod services;

pub use entities::*;
pub use services::*;
