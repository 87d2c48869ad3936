//! Metrics collection for the block builder

use shared_types::U256;
use std::sync::atomic::{AtomicU64, Ordering};

const GWEI: u64 = 1_000_000_000;

/// Metrics collector for block building
#[derive(Debug, Default)]
pub struct Metrics {
    /// Total blocks built
    pub blocks_built: AtomicU64,

    /// Total transactions included
    pub transactions_included: AtomicU64,

    /// Total transactions dropped after an engine rejection
    pub transactions_dropped: AtomicU64,

    /// Total candidates left in the pool for a later block
    pub transactions_skipped: AtomicU64,

    /// Total gas used across all blocks
    pub total_gas_used: AtomicU64,

    /// Total priority fees credited, in gwei
    pub total_priority_fees_gwei: AtomicU64,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a built block
    pub fn record_block_built(&self, tx_count: usize, gas_used: u64) {
        self.blocks_built.fetch_add(1, Ordering::Relaxed);
        self.transactions_included
            .fetch_add(tx_count as u64, Ordering::Relaxed);
        self.total_gas_used.fetch_add(gas_used, Ordering::Relaxed);
    }

    /// Record dropped and skipped candidates of one build
    pub fn record_rejections(&self, dropped: usize, skipped: usize) {
        self.transactions_dropped
            .fetch_add(dropped as u64, Ordering::Relaxed);
        self.transactions_skipped
            .fetch_add(skipped as u64, Ordering::Relaxed);
    }

    /// Record priority fees in wei
    pub fn record_priority_fees(&self, wei: U256) {
        let gwei = wei / U256::from(GWEI);
        let gwei = if gwei > U256::from(u64::MAX) {
            u64::MAX
        } else {
            gwei.as_u64()
        };
        self.total_priority_fees_gwei
            .fetch_add(gwei, Ordering::Relaxed);
    }

    /// Get blocks built
    pub fn get_blocks_built(&self) -> u64 {
        self.blocks_built.load(Ordering::Relaxed)
    }

    /// Get transactions dropped
    pub fn get_transactions_dropped(&self) -> u64 {
        self.transactions_dropped.load(Ordering::Relaxed)
    }

    /// Get average transactions per block
    pub fn get_avg_transactions_per_block(&self) -> f64 {
        let blocks = self.blocks_built.load(Ordering::Relaxed);
        if blocks == 0 {
            return 0.0;
        }
        let txs = self.transactions_included.load(Ordering::Relaxed);
        txs as f64 / blocks as f64
    }

    /// Get average gas per block
    pub fn get_avg_gas_per_block(&self) -> f64 {
        let blocks = self.blocks_built.load(Ordering::Relaxed);
        if blocks == 0 {
            return 0.0;
        }
        let gas = self.total_gas_used.load(Ordering::Relaxed);
        gas as f64 / blocks as f64
    }
}
