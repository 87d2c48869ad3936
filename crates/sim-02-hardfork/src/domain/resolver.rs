//! Block-height ruleset selection.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::activations::HardforkActivations;
use super::errors::HardforkError;
use super::hardfork::Hardfork;
use crate::config::{ChainConfig, MAINNET_CHAIN_ID};

/// Maps `(chain id, block number)` to the ruleset a block executes under.
///
/// Blocks produced locally (everything after the fork block, or every block
/// when not forked) run under the configured hardfork. Historical blocks of a
/// forked chain are looked up in that chain's activation history.
#[derive(Debug, Clone)]
pub struct HardforkResolver {
    hardfork: Hardfork,
    fork_block_number: Option<u64>,
    activations: HashMap<u64, HardforkActivations>,
}

impl HardforkResolver {
    /// Creates a resolver for a non-forked chain with the built-in mainnet history.
    pub fn new(hardfork: Hardfork) -> Self {
        let mut activations = HashMap::new();
        if let Ok(mainnet) = ChainConfig::mainnet().activations() {
            activations.insert(MAINNET_CHAIN_ID, mainnet);
        }
        Self {
            hardfork,
            fork_block_number: None,
            activations,
        }
    }

    /// Registers (or replaces) activation histories from configuration.
    pub fn with_chains(mut self, chains: &[ChainConfig]) -> Result<Self, HardforkError> {
        for chain in chains {
            self.activations.insert(chain.chain_id, chain.activations()?);
        }
        Ok(self)
    }

    /// Registers (or replaces) one chain's history.
    pub fn with_activations(mut self, chain_id: u64, activations: HardforkActivations) -> Self {
        self.activations.insert(chain_id, activations);
        self
    }

    /// Marks blocks up to and including `fork_block_number` as historical.
    pub fn forked_at(mut self, fork_block_number: u64) -> Self {
        self.fork_block_number = Some(fork_block_number);
        self
    }

    /// Ruleset for locally produced blocks.
    pub fn hardfork(&self) -> Hardfork {
        self.hardfork
    }

    /// Block the chain was forked from, if any.
    pub fn fork_block_number(&self) -> Option<u64> {
        self.fork_block_number
    }

    /// First block executed under the configured hardfork.
    pub fn local_start(&self) -> u64 {
        self.fork_block_number.map_or(0, |n| n.saturating_add(1))
    }

    /// Activation history registered for `chain_id`.
    pub fn activations(&self, chain_id: u64) -> Option<&HardforkActivations> {
        self.activations.get(&chain_id)
    }

    /// Ruleset for `block_number` of chain `chain_id`.
    pub fn resolve(&self, chain_id: u64, block_number: u64) -> Result<Hardfork, HardforkError> {
        if block_number >= self.local_start() {
            return Ok(self.hardfork);
        }

        let fork_block_number = self.fork_block_number.unwrap_or_default();
        let activations = self.activations.get(&chain_id).ok_or_else(|| {
            warn!(chain_id, block_number, fork_block_number, "No activation history for historical block");
            HardforkError::UnknownHistoricalHardfork {
                chain_id,
                block_number,
                fork_block_number,
            }
        })?;

        let hardfork = activations.hardfork_at_block(block_number).ok_or_else(|| {
            HardforkError::NoActivationForBlock {
                chain_id,
                block_number,
                first_activation: activations.first_block(),
            }
        })?;

        debug!(chain_id, block_number, %hardfork, "Resolved historical hardfork");
        Ok(hardfork)
    }

    /// Rejects forking a chain whose ruleset at the fork block predates Spurious Dragon.
    ///
    /// Returns the remote ruleset when a history is known, `None` otherwise.
    pub fn check_fork_point(
        &self,
        chain_id: u64,
        fork_block_number: u64,
    ) -> Result<Option<Hardfork>, HardforkError> {
        let remote = self
            .activations
            .get(&chain_id)
            .and_then(|activations| activations.hardfork_at_block(fork_block_number));

        match remote {
            Some(hardfork) if hardfork < Hardfork::SpuriousDragon => {
                Err(HardforkError::UnsupportedForkHardfork {
                    chain_id,
                    fork_block_number,
                    hardfork,
                })
            }
            other => Ok(other),
        }
    }
}
