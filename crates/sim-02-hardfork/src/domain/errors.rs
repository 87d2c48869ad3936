//! Hardfork resolution error types.

use thiserror::Error;

use super::hardfork::{Feature, Hardfork};

/// Errors raised while selecting or validating a ruleset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HardforkError {
    /// The name does not match any supported ruleset.
    #[error("Unknown hardfork name: {0}")]
    UnknownHardfork(String),

    /// A historical block was requested and no activation history is known.
    #[error(
        "No known hardfork for execution on historical block {block_number} (relative to fork block number {fork_block_number}) in chain with id {chain_id}. The node was not configured with a hardfork activation history."
    )]
    UnknownHistoricalHardfork {
        /// Remote chain id
        chain_id: u64,
        /// Requested block
        block_number: u64,
        /// Block the node forked from
        fork_block_number: u64,
    },

    /// The activation history starts after the requested block.
    #[error("Could not find a hardfork to run for block {block_number} in chain with id {chain_id}; the first activation is at block {first_activation}")]
    NoActivationForBlock {
        /// Remote chain id
        chain_id: u64,
        /// Requested block
        block_number: u64,
        /// Earliest block in the activation history
        first_activation: u64,
    },

    /// The requested feature is newer than the ruleset in force.
    #[error("{feature} is not supported by hardfork {hardfork}; it was activated in {activated_in}")]
    FeatureNotActivated {
        /// Requested feature
        feature: Feature,
        /// Ruleset in force
        hardfork: Hardfork,
        /// First ruleset supporting the feature
        activated_in: Hardfork,
    },

    /// The remote chain runs a ruleset too old to fork from.
    #[error("Cannot fork chain {chain_id} from block {fork_block_number}. The hardfork must be at least spuriousDragon, but {hardfork} was detected.")]
    UnsupportedForkHardfork {
        /// Remote chain id
        chain_id: u64,
        /// Block the node forks from
        fork_block_number: u64,
        /// Ruleset detected at the fork block
        hardfork: Hardfork,
    },

    /// An activation history is not strictly increasing.
    #[error("Invalid activation history for chain {chain_id}: {reason}")]
    InvalidActivations {
        /// Chain the history belongs to
        chain_id: u64,
        /// What is wrong with it
        reason: String,
    },
}
