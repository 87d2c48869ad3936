//! Ports layer for the fork data source.

pub mod outbound;

pub use outbound::*;
