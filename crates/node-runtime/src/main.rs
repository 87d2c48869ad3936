//! # Sim-Chain Node Runtime
//!
//! Runs a standalone simulated node.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (logs + metrics) from the environment
//! 2. Load configuration from the file given as first argument or `SIM_CONFIG`
//! 3. Create the node (genesis block, funded accounts)
//! 4. Start interval mining when configured
//! 5. Wait for Ctrl+C, then shut down
//!
//! Forking needs a remote provider, which the binary does not ship; a
//! configuration with a `[fork]` section is refused.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::sync::watch;
use tracing::{debug, error, info};

use node_runtime::{Node, NodeConfig};
use sim_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};

/// The running node plus its background tasks.
struct NodeRuntime {
    node: Arc<Node>,
    mining_interval: Option<Duration>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl NodeRuntime {
    async fn new(config: NodeConfig) -> Result<Self> {
        if config.fork.is_some() {
            bail!("forking requires a remote provider and is only available through the library");
        }
        let mining_interval = config.mining.interval_secs.map(Duration::from_secs);
        let node = Node::new(config)
            .await
            .context("Failed to initialize node")?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            node: Arc::new(node),
            mining_interval,
            shutdown_tx,
            shutdown_rx,
        })
    }

    fn start(&self) {
        info!("===========================================");
        info!("  Sim-Chain Node Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("  Chain id: {}", self.node.chain_id());
        info!("  Hardfork: {}", self.node.hardfork());
        info!("===========================================");

        let Some(interval) = self.mining_interval else {
            info!("Interval mining disabled, blocks are mined on demand");
            return;
        };

        let node = Arc::clone(&self.node);
        let mut shutdown = self.shutdown_rx.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = node.mine_block(None).await {
                            error!(error = %e, "Interval mining failed");
                        }
                    }
                    _ = shutdown.changed() => {
                        info!("[miner] Shutdown signal received");
                        break;
                    }
                }
            }
        });
        info!(interval_secs = interval.as_secs(), "Interval mining started");
    }

    async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
        match encode_metrics() {
            Ok(metrics) => debug!(%metrics, "Final metrics"),
            Err(e) => error!(error = %e, "Failed to encode metrics"),
        }
        info!("Shutdown complete");
    }
}

/// Load configuration from the first argument or `SIM_CONFIG`; defaults otherwise.
fn load_config() -> Result<NodeConfig> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("SIM_CONFIG").ok())
        .map(PathBuf::from);

    let Some(path) = path else {
        info!("No configuration file given, using defaults");
        return Ok(NodeConfig::default());
    };

    let source = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config = NodeConfig::from_toml_str(&source)
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    info!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(TelemetryConfig::from_env())?;

    let config = load_config()?;
    let runtime = NodeRuntime::new(config).await?;
    runtime.start();

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;
    Ok(())
}
