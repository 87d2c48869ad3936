//! Hexagonal architecture ports

pub mod outbound;

pub use outbound::*;
