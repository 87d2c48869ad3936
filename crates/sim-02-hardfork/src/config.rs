//! Chain configuration: activation histories per chain id.

use serde::{Deserialize, Serialize};

use crate::domain::{Activation, Hardfork, HardforkActivations, HardforkError};

/// Ethereum mainnet chain id.
pub const MAINNET_CHAIN_ID: u64 = 1;

/// Activation history of a remote chain, as written in configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    /// Chain id the history applies to
    pub chain_id: u64,

    /// Human-readable chain name, used in errors and logs
    #[serde(default)]
    pub name: String,

    /// Activations, ascending by block number
    pub hardfork_history: Vec<Activation>,
}

impl ChainConfig {
    /// Validated activation history.
    pub fn activations(&self) -> Result<HardforkActivations, HardforkError> {
        HardforkActivations::new(self.chain_id, self.hardfork_history.clone())
    }

    /// Built-in mainnet history.
    ///
    /// Constantinople and Petersburg activated at the same block; only
    /// Petersburg is listed.
    pub fn mainnet() -> Self {
        let history = [
            (0, Hardfork::Frontier),
            (1_150_000, Hardfork::Homestead),
            (1_920_000, Hardfork::Dao),
            (2_463_000, Hardfork::TangerineWhistle),
            (2_675_000, Hardfork::SpuriousDragon),
            (4_370_000, Hardfork::Byzantium),
            (7_280_000, Hardfork::Petersburg),
            (9_069_000, Hardfork::Istanbul),
            (9_200_000, Hardfork::MuirGlacier),
            (12_244_000, Hardfork::Berlin),
            (12_965_000, Hardfork::London),
            (13_773_000, Hardfork::ArrowGlacier),
            (15_050_000, Hardfork::GrayGlacier),
            (15_537_394, Hardfork::Merge),
            (17_034_870, Hardfork::Shanghai),
            (19_426_587, Hardfork::Cancun),
            (22_431_084, Hardfork::Prague),
        ];

        Self {
            chain_id: MAINNET_CHAIN_ID,
            name: "mainnet".to_string(),
            hardfork_history: history
                .iter()
                .map(|(block_number, hardfork)| Activation {
                    block_number: *block_number,
                    hardfork: *hardfork,
                })
                .collect(),
        }
    }
}
