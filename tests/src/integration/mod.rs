//! Cross-subsystem scenarios.

pub mod fixtures;

mod block_selection;
mod failure_policy;
mod forking;
mod hardforks;
mod settlement;
mod timestamps;
