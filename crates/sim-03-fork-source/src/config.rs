//! Fork configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Remote chain the node forks from.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ForkConfig {
    /// Remote endpoint, used for logs
    pub url: String,

    /// Block to pin; defaults to the recommended safe block
    pub block_number: Option<u64>,

    /// Directory for the persistent response cache
    pub cache_dir: Option<PathBuf>,
}

/// Number of blocks behind the head considered final for caching.
pub fn safe_block_depth(chain_id: u64) -> u64 {
    if chain_id == 1 {
        64
    } else {
        128
    }
}

/// Fork block to use when none is configured.
///
/// A chain shorter than the safe depth is pinned at its head.
pub fn recommended_fork_block_number(chain_id: u64, latest_block_number: u64) -> u64 {
    let depth = safe_block_depth(chain_id);
    if latest_block_number > depth {
        latest_block_number - depth
    } else {
        latest_block_number
    }
}
