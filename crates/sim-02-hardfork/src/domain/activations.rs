//! Per-chain hardfork activation history.

use serde::{Deserialize, Serialize};

use super::errors::HardforkError;
use super::hardfork::Hardfork;

/// A ruleset and the block it activates at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activation {
    /// First block executed under `hardfork`.
    pub block_number: u64,
    /// The ruleset.
    pub hardfork: Hardfork,
}

/// Ordered activation history of one chain.
///
/// Block numbers are strictly increasing; the history is immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HardforkActivations {
    entries: Vec<Activation>,
}

impl HardforkActivations {
    /// Validates and wraps an activation list.
    pub fn new(chain_id: u64, entries: Vec<Activation>) -> Result<Self, HardforkError> {
        if entries.is_empty() {
            return Err(HardforkError::InvalidActivations {
                chain_id,
                reason: "history is empty".to_string(),
            });
        }

        for pair in entries.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            if next.block_number <= prev.block_number {
                return Err(HardforkError::InvalidActivations {
                    chain_id,
                    reason: format!(
                        "{} at block {} does not follow {} at block {}",
                        next.hardfork, next.block_number, prev.hardfork, prev.block_number
                    ),
                });
            }
            if next.hardfork <= prev.hardfork {
                return Err(HardforkError::InvalidActivations {
                    chain_id,
                    reason: format!("{} is listed after {}", next.hardfork, prev.hardfork),
                });
            }
        }

        Ok(Self { entries })
    }

    /// Builds a history from `(block, name)` pairs, rejecting unknown names.
    pub fn from_named(chain_id: u64, entries: &[(u64, &str)]) -> Result<Self, HardforkError> {
        let entries = entries
            .iter()
            .map(|(block_number, name)| {
                Ok(Activation {
                    block_number: *block_number,
                    hardfork: Hardfork::from_name(name)?,
                })
            })
            .collect::<Result<Vec<_>, HardforkError>>()?;
        Self::new(chain_id, entries)
    }

    /// Ruleset with the greatest activation block at or below `block_number`.
    pub fn hardfork_at_block(&self, block_number: u64) -> Option<Hardfork> {
        let idx = self
            .entries
            .partition_point(|activation| activation.block_number <= block_number);
        idx.checked_sub(1).map(|i| self.entries[i].hardfork)
    }

    /// Earliest activation block.
    pub fn first_block(&self) -> u64 {
        self.entries.first().map_or(0, |a| a.block_number)
    }

    /// Activations in block order.
    pub fn entries(&self) -> &[Activation] {
        &self.entries
    }
}
