//! Configuration types for block building

use serde::Deserialize;

/// Runtime configuration for the block builder
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuilderConfig {
    /// Base fee of the first fee-market block when the parent has none
    pub initial_base_fee_per_gas: u64,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            initial_base_fee_per_gas: crate::DEFAULT_INITIAL_BASE_FEE,
        }
    }
}
