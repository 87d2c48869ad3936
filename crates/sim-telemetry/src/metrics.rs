//! Prometheus metrics for Sim-Chain subsystems.
//!
//! All metrics follow the naming convention: `sim_<subsystem>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., blocks_mined_total)
//! - **Gauge**: Value that can go up or down (e.g., mempool pending count)

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // MEMPOOL METRICS
    // =========================================================================

    /// Transactions accepted into the pool
    pub static ref TRANSACTIONS_ADMITTED: Counter = Counter::new(
        "sim_mempool_transactions_admitted_total",
        "Total transactions admitted into the pool"
    ).expect("metric creation failed");

    /// Transactions rejected at admission, by reason
    pub static ref TRANSACTIONS_REJECTED: CounterVec = CounterVec::new(
        Opts::new("sim_mempool_transactions_rejected_total", "Transactions rejected at admission"),
        &["reason"]
    ).expect("metric creation failed");

    /// Transactions dropped during block building
    pub static ref TRANSACTIONS_DROPPED: Counter = Counter::new(
        "sim_mempool_transactions_dropped_total",
        "Transactions dropped after failing execution"
    ).expect("metric creation failed");

    /// Executable transactions in the pool
    pub static ref MEMPOOL_PENDING: Gauge = Gauge::new(
        "sim_mempool_pending",
        "Number of pending (executable) transactions"
    ).expect("metric creation failed");

    /// Nonce-gapped transactions in the pool
    pub static ref MEMPOOL_QUEUED: Gauge = Gauge::new(
        "sim_mempool_queued",
        "Number of queued (nonce-gapped) transactions"
    ).expect("metric creation failed");

    // =========================================================================
    // BLOCK BUILDER METRICS
    // =========================================================================

    /// Blocks mined
    pub static ref BLOCKS_MINED: Counter = Counter::new(
        "sim_builder_blocks_mined_total",
        "Total number of blocks mined"
    ).expect("metric creation failed");

    /// Gas used by the latest mined block
    pub static ref BLOCK_GAS_USED: Gauge = Gauge::new(
        "sim_builder_block_gas_used",
        "Gas used by the most recently mined block"
    ).expect("metric creation failed");

    // =========================================================================
    // FORK SOURCE METRICS
    // =========================================================================

    /// Fork cache hits
    pub static ref FORK_CACHE_HITS: Counter = Counter::new(
        "sim_fork_cache_hits_total",
        "Remote queries served from the fork cache"
    ).expect("metric creation failed");

    /// Fork cache misses
    pub static ref FORK_CACHE_MISSES: Counter = Counter::new(
        "sim_fork_cache_misses_total",
        "Remote queries not found in the fork cache"
    ).expect("metric creation failed");

    /// Remote fetches by method
    pub static ref FORK_REMOTE_FETCHES: CounterVec = CounterVec::new(
        Opts::new("sim_fork_remote_fetches_total", "Requests sent to the remote provider"),
        &["method"]
    ).expect("metric creation failed");
}

/// Handle for the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Registering twice is harmless: already-registered collectors are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Mempool
        Box::new(TRANSACTIONS_ADMITTED.clone()),
        Box::new(TRANSACTIONS_REJECTED.clone()),
        Box::new(TRANSACTIONS_DROPPED.clone()),
        Box::new(MEMPOOL_PENDING.clone()),
        Box::new(MEMPOOL_QUEUED.clone()),
        // Builder
        Box::new(BLOCKS_MINED.clone()),
        Box::new(BLOCK_GAS_USED.clone()),
        // Fork source
        Box::new(FORK_CACHE_HITS.clone()),
        Box::new(FORK_CACHE_MISSES.clone()),
        Box::new(FORK_REMOTE_FETCHES.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
