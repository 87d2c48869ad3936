//! Ports layer for the time controller.

pub mod outbound;

pub use outbound::*;
