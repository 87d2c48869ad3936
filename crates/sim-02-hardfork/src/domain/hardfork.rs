//! The closed set of supported rulesets.

use serde::{Deserialize, Serialize};
use shared_types::{U256, ONE_ETHER};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::errors::HardforkError;

/// Protocol ruleset, ordered by activation on mainnet.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Hardfork {
    Frontier,
    Homestead,
    Dao,
    TangerineWhistle,
    SpuriousDragon,
    Byzantium,
    Constantinople,
    Petersburg,
    Istanbul,
    MuirGlacier,
    Berlin,
    London,
    ArrowGlacier,
    GrayGlacier,
    Merge,
    Shanghai,
    Cancun,
    Prague,
}

/// Protocol features gated on a minimum ruleset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "camelCase")]
pub enum Feature {
    /// Base fee and priority fee pricing.
    FeeMarket,
}

impl Feature {
    /// First ruleset that supports the feature.
    pub fn activated_in(&self) -> Hardfork {
        match self {
            Self::FeeMarket => Hardfork::London,
        }
    }
}

impl Hardfork {
    /// The newest supported ruleset.
    pub const LATEST: Hardfork = Hardfork::Prague;

    /// Parses a conventional camelCase ruleset name (`"london"`, `"tangerineWhistle"`).
    pub fn from_name(name: &str) -> Result<Self, HardforkError> {
        name.parse()
            .map_err(|_| HardforkError::UnknownHardfork(name.to_string()))
    }

    /// Returns true if base fee pricing applies.
    pub fn supports_fee_market(&self) -> bool {
        self.supports(Feature::FeeMarket)
    }

    /// Returns true if `feature` is active under this ruleset.
    pub fn supports(&self, feature: Feature) -> bool {
        *self >= feature.activated_in()
    }

    /// Fails with `FeatureNotActivated` when `feature` predates this ruleset.
    pub fn require(&self, feature: Feature) -> Result<(), HardforkError> {
        if self.supports(feature) {
            Ok(())
        } else {
            Err(HardforkError::FeatureNotActivated {
                feature,
                hardfork: *self,
                activated_in: feature.activated_in(),
            })
        }
    }

    /// Fixed block subsidy paid to the coinbase.
    pub fn block_reward(&self) -> U256 {
        let ether = U256::from(ONE_ETHER);
        if *self < Hardfork::Byzantium {
            ether * 5
        } else if *self < Hardfork::Constantinople {
            ether * 3
        } else if *self < Hardfork::Merge {
            ether * 2
        } else {
            U256::zero()
        }
    }
}

impl Default for Hardfork {
    fn default() -> Self {
        Self::LATEST
    }
}
