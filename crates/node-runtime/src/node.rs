//! # Node
//!
//! Orchestrates the subsystems behind the node-level operations.
//!
//! ## Mining Flow
//!
//! ```text
//! mine_block(timestamp?)
//!   │
//!   ├─ TimeController::plan_next_timestamp   (no state change yet)
//!   ├─ HardforkResolver::resolve             (ruleset of the new block)
//!   ├─ BlockBuilder::build                   (engine holds a pending block)
//!   ├─ BlockchainStore::put_block ── fails ──→ ExecutionEngine::discard_block
//!   ├─ ExecutionEngine::commit_block
//!   └─ pool.on_block_mined / drop_transaction, TimeController::commit
//! ```
//!
//! Nothing observable changes unless the block has been persisted.
//!
//! ## Concurrency
//!
//! Mutable state lives in one `NodeState` behind a `tokio::sync::RwLock`.
//! Mutating operations hold the write lock for their whole duration, which
//! serializes mining; queries take the read lock and never see a block
//! mid-build.

use std::sync::Arc;

use serde::Serialize;
use shared_types::{
    format_address, format_hash, Address, Block, BlockContext, CallOutcome, CallParams, Hash,
    Receipt, SignedTransaction, StoreError, U256,
};
use sim_01_time_control::{Clock, SystemClock, TimeController, TimeState};
use sim_02_hardfork::{Feature, Hardfork, HardforkResolver};
use sim_03_fork_source::{ForkDataSource, RemoteProvider};
use sim_04_mempool::{Admission, PoolSnapshot, TransactionPool};
use sim_05_block_builder::{BlockBuilder, BuildOutcome, BuildRequest, ExecutionEngine, Metrics};
use sim_telemetry::{
    log_block_event, log_tx_event, BLOCKS_MINED, BLOCK_GAS_USED, MEMPOOL_PENDING, MEMPOOL_QUEUED,
    TRANSACTIONS_ADMITTED, TRANSACTIONS_DROPPED, TRANSACTIONS_REJECTED,
};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::adapters::{InMemoryBlockchain, InMemoryExecutionEngine};
use crate::container::NodeConfig;
use crate::error::NodeError;
use crate::genesis::{default_accounts, GenesisBuilder, DEFAULT_ACCOUNT_COUNT};
use crate::ports::BlockchainStore;

const SUBSYSTEM: &str = "node";

/// Mutable node state, owned by the node and changed only through its setters.
struct NodeState {
    pool: TransactionPool,
    time: TimeController,
    block_gas_limit: u64,
    coinbase: Address,
    next_block_base_fee: Option<U256>,
}

/// Point-in-time view of the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSnapshot {
    /// Chain id.
    pub chain_id: u64,
    /// Ruleset of locally produced blocks.
    pub hardfork: Hardfork,
    /// Pinned remote block, if forked.
    pub fork_block_number: Option<u64>,
    /// Latest block number.
    pub latest_block_number: u64,
    /// Gas budget of the next block.
    pub block_gas_limit: u64,
    /// Beneficiary of the next block.
    pub coinbase: Address,
    /// Time offset and pending override.
    pub time: TimeState,
    /// Base fee set for the next block only.
    pub next_block_base_fee: Option<U256>,
    /// Pool classification state.
    pub pool: PoolSnapshot,
}

/// The simulated node.
pub struct Node {
    state: RwLock<NodeState>,
    engine: Arc<dyn ExecutionEngine>,
    store: Arc<dyn BlockchainStore>,
    builder: BlockBuilder,
    resolver: HardforkResolver,
    fork: Option<Arc<ForkDataSource>>,
    chain_id: u64,
}

impl Node {
    /// Standalone node on the system clock with in-memory adapters.
    pub async fn new(config: NodeConfig) -> Result<Self, NodeError> {
        Self::with_clock(config, Arc::new(SystemClock)).await
    }

    /// Standalone node with in-memory adapters and the given clock.
    ///
    /// Genesis accounts come from the configuration, or are derived when
    /// none are configured.
    pub async fn with_clock(config: NodeConfig, clock: Arc<dyn Clock>) -> Result<Self, NodeError> {
        let engine = Arc::new(InMemoryExecutionEngine::new());
        let accounts = if config.genesis_accounts.is_empty() {
            default_accounts(DEFAULT_ACCOUNT_COUNT)
        } else {
            config.genesis_accounts.clone()
        };
        for account in &accounts {
            engine.fund(account.address, account.balance);
        }
        Self::standalone(config, clock, engine, Arc::new(InMemoryBlockchain::new())).await
    }

    /// Standalone node over caller-supplied adapters.
    ///
    /// The engine must already hold the genesis state; the store must be empty.
    pub async fn standalone(
        config: NodeConfig,
        clock: Arc<dyn Clock>,
        engine: Arc<dyn ExecutionEngine>,
        store: Arc<dyn BlockchainStore>,
    ) -> Result<Self, NodeError> {
        config.validate()?;
        let resolver = HardforkResolver::new(config.hardfork).with_chains(&config.chains)?;
        let time = time_controller(&config, Arc::clone(&clock));
        let timestamp = config.initial_timestamp.unwrap_or_else(|| clock.now_seconds());

        let context = BlockContext {
            number: 0,
            timestamp,
            coinbase: config.coinbase,
            gas_limit: config.block_gas_limit,
            base_fee_per_gas: None,
        };
        engine.begin_block(&context).await?;
        let state_root = match engine.finalize_block(config.coinbase, U256::zero()).await {
            Ok(root) => root,
            Err(e) => {
                engine.discard_block().await;
                return Err(e.into());
            }
        };

        let genesis = GenesisBuilder::new(timestamp, config.block_gas_limit, config.coinbase, config.hardfork)
            .with_initial_base_fee(U256::from(config.builder.initial_base_fee_per_gas))
            .build(state_root);
        if let Err(e) = store.put_block(genesis.clone(), Vec::new()).await {
            engine.discard_block().await;
            return Err(e.into());
        }
        engine.commit_block().await?;

        info!(
            chain_id = config.chain_id,
            hardfork = %config.hardfork,
            genesis = %format_hash(&genesis.hash()),
            timestamp,
            "Standalone node initialized"
        );

        let chain_id = config.chain_id;
        Ok(Self::assemble(&config, chain_id, time, engine, store, resolver, None))
    }

    /// Node forked from a remote chain at the configured (or recommended) block.
    ///
    /// The local chain starts at the pinned remote block; all older data and
    /// the initial state are served by the fork data source.
    pub async fn fork(
        config: NodeConfig,
        provider: Arc<dyn RemoteProvider>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, NodeError> {
        config.validate()?;
        let fork_config = config.fork.clone().unwrap_or_default();
        let fork = Arc::new(ForkDataSource::connect(provider, &fork_config).await?);
        let chain_id = fork.chain_id();
        let fork_block_number = fork.fork_block_number();

        let resolver = HardforkResolver::new(config.hardfork)
            .with_chains(&config.chains)?
            .forked_at(fork_block_number);
        let remote_hardfork = resolver.check_fork_point(chain_id, fork_block_number)?;

        let fork_block = fork
            .get_block_by_number(fork_block_number)
            .await?
            .ok_or(NodeError::ForkBlockNotFound(fork_block_number))?;

        let store = Arc::new(InMemoryBlockchain::new());
        store.put_block(fork_block, Vec::new()).await?;
        let engine = Arc::new(InMemoryExecutionEngine::forked(Arc::clone(&fork)));
        let time = time_controller(&config, clock);

        info!(
            chain_id,
            fork_block_number,
            remote_hardfork = ?remote_hardfork,
            hardfork = %config.hardfork,
            "Forked node initialized"
        );

        Ok(Self::assemble(&config, chain_id, time, engine, store, resolver, Some(fork)))
    }

    fn assemble(
        config: &NodeConfig,
        chain_id: u64,
        time: TimeController,
        engine: Arc<dyn ExecutionEngine>,
        store: Arc<dyn BlockchainStore>,
        resolver: HardforkResolver,
        fork: Option<Arc<ForkDataSource>>,
    ) -> Self {
        let mut pool = TransactionPool::new(config.mempool.clone());
        pool.set_block_gas_limit(config.block_gas_limit);
        let builder = BlockBuilder::new(Arc::clone(&engine), config.builder.clone());

        Self {
            state: RwLock::new(NodeState {
                pool,
                time,
                block_gas_limit: config.block_gas_limit,
                coinbase: config.coinbase,
                next_block_base_fee: config.next_block_base_fee,
            }),
            engine,
            store,
            builder,
            resolver,
            fork,
            chain_id,
        }
    }

    /// Chain id (the remote one when forked).
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Ruleset of locally produced blocks.
    pub fn hardfork(&self) -> Hardfork {
        self.resolver.hardfork()
    }

    /// Pinned remote block, if forked.
    pub fn fork_block_number(&self) -> Option<u64> {
        self.resolver.fork_block_number()
    }

    /// Fork data source, if forked.
    pub fn fork_source(&self) -> Option<&Arc<ForkDataSource>> {
        self.fork.as_ref()
    }

    /// Block builder counters.
    pub fn builder_metrics(&self) -> Arc<Metrics> {
        self.builder.metrics()
    }

    /// Number of the latest block.
    pub async fn latest_block_number(&self) -> Result<u64, NodeError> {
        Ok(self.store.get_latest_block_number().await?)
    }

    // =========================================================================
    // TRANSACTIONS
    // =========================================================================

    /// Submits a signed transaction to the pool.
    pub async fn send_transaction(&self, tx: SignedTransaction) -> Result<Admission, NodeError> {
        if tx.is_fee_market() {
            self.resolver.hardfork().require(Feature::FeeMarket)?;
        }

        let mut state = self.state.write().await;
        let account = self.engine.get_account(tx.sender()).await?;
        let hash = format_hash(&tx.hash());

        match state.pool.add(tx, &account) {
            Ok(admission) => {
                TRANSACTIONS_ADMITTED.inc();
                record_pool_gauges(&state.pool);
                log_tx_event!(
                    info,
                    SUBSYSTEM,
                    "Transaction admitted",
                    hash,
                    class = ?admission.class,
                    promoted = admission.promoted
                );
                Ok(admission)
            }
            Err(e) => {
                TRANSACTIONS_REJECTED.with_label_values(&[e.reason()]).inc();
                log_tx_event!(warn, SUBSYSTEM, "Transaction rejected", hash, error = %e);
                Err(e.into())
            }
        }
    }

    /// Every pooled transaction, pending and queued, in arrival order.
    pub async fn get_pending_transactions(&self) -> Vec<SignedTransaction> {
        self.state
            .read()
            .await
            .pool
            .all()
            .into_iter()
            .map(|entry| entry.transaction.clone())
            .collect()
    }

    /// Receipt of a mined transaction; remote receipts when forked.
    pub async fn get_transaction_receipt(&self, hash: Hash) -> Result<Option<Receipt>, NodeError> {
        let _state = self.state.read().await;
        if let Some(receipt) = self.store.get_receipt(hash).await? {
            return Ok(Some(receipt));
        }
        match &self.fork {
            Some(fork) => Ok(fork.get_transaction_receipt(hash).await?),
            None => Ok(None),
        }
    }

    // =========================================================================
    // MINING
    // =========================================================================

    /// Mines one block, optionally at an explicit timestamp.
    ///
    /// An empty pool produces an empty block.
    #[instrument(skip(self))]
    pub async fn mine_block(&self, timestamp: Option<u64>) -> Result<BuildOutcome, NodeError> {
        let mut state = self.state.write().await;
        let parent = self.store.get_latest_block().await?;
        let decision = state
            .time
            .plan_next_timestamp(timestamp, parent.header.timestamp)?;
        let number = parent.number() + 1;
        let hardfork = self.resolver.resolve(self.chain_id, number)?;

        let request = BuildRequest {
            parent: parent.header,
            timestamp: decision.timestamp,
            gas_limit: state.block_gas_limit,
            coinbase: state.coinbase,
            hardfork,
            base_fee_override: state.next_block_base_fee,
        };
        let outcome = self
            .builder
            .build(request, state.pool.pending_by_sender())
            .await?;

        if let Err(e) = self
            .store
            .put_block(outcome.block.clone(), outcome.receipts.clone())
            .await
        {
            warn!(number, error = %e, "Failed to persist block, discarding");
            self.engine.discard_block().await;
            return Err(e.into());
        }
        self.engine.commit_block().await?;
        // The block is final from here on.
        state.time.commit(&decision);
        state.next_block_base_fee = None;

        state.pool.on_block_mined(&outcome.included());
        for dropped in &outcome.dropped {
            if state.pool.drop_transaction(&dropped.hash).is_ok() {
                TRANSACTIONS_DROPPED.inc();
            }
            match self.engine.get_account(dropped.sender).await {
                Ok(account) => state.pool.update_account_nonce(&dropped.sender, account.nonce),
                Err(e) => warn!(
                    sender = %format_address(&dropped.sender),
                    error = %e,
                    "Failed to resync sender nonce after drop"
                ),
            }
        }

        BLOCKS_MINED.inc();
        BLOCK_GAS_USED.set(outcome.block.header.gas_used as f64);
        record_pool_gauges(&state.pool);
        log_block_event!(
            info,
            SUBSYSTEM,
            "Block mined",
            number,
            hash = %format_hash(&outcome.block.hash()),
            timestamp = decision.timestamp,
            source = ?decision.source,
            tx_count = outcome.block.transactions.len(),
            dropped = outcome.dropped.len()
        );
        Ok(outcome)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Latest balance of an account.
    pub async fn get_account_balance(&self, address: Address) -> Result<U256, NodeError> {
        let _state = self.state.read().await;
        Ok(self.engine.get_account(address).await?.balance)
    }

    /// Balance of an account at the end of `block_number`.
    pub async fn get_account_balance_at(
        &self,
        address: Address,
        block_number: u64,
    ) -> Result<U256, NodeError> {
        let _state = self.state.read().await;
        let latest = self.store.get_latest_block_number().await?;
        if block_number > latest {
            return Err(NodeError::BlockNotFound {
                requested: block_number,
                latest,
            });
        }
        Ok(self.engine.get_account_at(address, block_number).await?.balance)
    }

    /// Block by number: the fork source up to the pinned block, the store after.
    pub async fn get_block_by_number(&self, number: u64) -> Result<Option<Block>, NodeError> {
        let _state = self.state.read().await;
        self.block(number).await
    }

    async fn block(&self, number: u64) -> Result<Option<Block>, NodeError> {
        if let Some(fork) = &self.fork {
            if number <= fork.fork_block_number() {
                return Ok(fork.get_block_by_number(number).await?);
            }
        }
        match self.store.get_block_by_number(number).await {
            Ok(block) => Ok(Some(block)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Executes a call without mining; defaults to the pending block.
    ///
    /// The call runs under the ruleset of the targeted block, so fee-market
    /// parameters against a pre-London block fail with `FeatureNotActivated`.
    pub async fn run_call(
        &self,
        params: CallParams,
        block_number: Option<u64>,
    ) -> Result<CallOutcome, NodeError> {
        let state = self.state.read().await;
        let latest = self.store.get_latest_block().await?;

        let (context, hardfork) = match block_number {
            None => {
                let number = latest.number() + 1;
                let hardfork = self.resolver.resolve(self.chain_id, number)?;
                let decision = state
                    .time
                    .plan_next_timestamp(None, latest.header.timestamp)?;
                let request = BuildRequest {
                    parent: latest.header.clone(),
                    timestamp: decision.timestamp,
                    gas_limit: state.block_gas_limit,
                    coinbase: state.coinbase,
                    hardfork,
                    base_fee_override: state.next_block_base_fee,
                };
                let context = BlockContext {
                    number,
                    timestamp: decision.timestamp,
                    coinbase: state.coinbase,
                    gas_limit: state.block_gas_limit,
                    base_fee_per_gas: self.builder.base_fee_for(&request),
                };
                (context, hardfork)
            }
            Some(number) => {
                if number > latest.number() {
                    return Err(NodeError::BlockNotFound {
                        requested: number,
                        latest: latest.number(),
                    });
                }
                let hardfork = self.resolver.resolve(self.chain_id, number)?;
                let header = self
                    .block(number)
                    .await?
                    .ok_or(NodeError::BlockNotFound {
                        requested: number,
                        latest: latest.number(),
                    })?
                    .header;
                let context = BlockContext {
                    number,
                    timestamp: header.timestamp,
                    coinbase: header.coinbase,
                    gas_limit: header.gas_limit,
                    base_fee_per_gas: header.base_fee_per_gas,
                };
                (context, hardfork)
            }
        };

        if params.uses_fee_market() {
            hardfork.require(Feature::FeeMarket)?;
        }
        debug!(number = context.number, %hardfork, "Running call");
        Ok(self.engine.run_call(&params, &context, hardfork).await?)
    }

    /// Point-in-time view of the node state.
    pub async fn snapshot(&self) -> Result<NodeSnapshot, NodeError> {
        let state = self.state.read().await;
        Ok(NodeSnapshot {
            chain_id: self.chain_id,
            hardfork: self.resolver.hardfork(),
            fork_block_number: self.resolver.fork_block_number(),
            latest_block_number: self.store.get_latest_block_number().await?,
            block_gas_limit: state.block_gas_limit,
            coinbase: state.coinbase,
            time: state.time.state(),
            next_block_base_fee: state.next_block_base_fee,
            pool: state.pool.snapshot(),
        })
    }

    // =========================================================================
    // SETTERS
    // =========================================================================

    /// Sets the gas budget of future blocks and of future admissions.
    ///
    /// Pooled transactions above the new limit stay pooled and are skipped
    /// at build time.
    pub async fn set_block_gas_limit(&self, limit: u64) -> Result<(), NodeError> {
        if limit == 0 {
            return Err(NodeError::InvalidGasLimit);
        }
        let mut state = self.state.write().await;
        state.block_gas_limit = limit;
        state.pool.set_block_gas_limit(limit);
        info!(limit, "Block gas limit set");
        Ok(())
    }

    /// Sets the timestamp of the next automatically stamped block.
    pub async fn set_next_block_timestamp(&self, timestamp: u64) -> Result<(), NodeError> {
        let mut state = self.state.write().await;
        let previous = self.store.get_latest_block().await?.header.timestamp;
        state.time.set_next_timestamp(timestamp, previous)?;
        Ok(())
    }

    /// Moves all future automatic timestamps forward; returns the new offset.
    pub async fn increase_time(&self, seconds: u64) -> Result<i64, NodeError> {
        Ok(self.state.write().await.time.advance_time(seconds)?)
    }

    /// Sets the beneficiary of future blocks.
    pub async fn set_coinbase(&self, coinbase: Address) {
        self.state.write().await.coinbase = coinbase;
        info!(coinbase = %format_address(&coinbase), "Coinbase set");
    }

    /// Sets the base fee of the next block only.
    pub async fn set_next_block_base_fee(&self, fee: U256) -> Result<(), NodeError> {
        self.resolver.hardfork().require(Feature::FeeMarket)?;
        self.state.write().await.next_block_base_fee = Some(fee);
        Ok(())
    }
}

fn time_controller(config: &NodeConfig, clock: Arc<dyn Clock>) -> TimeController {
    match config.initial_timestamp {
        Some(timestamp) => TimeController::with_initial_timestamp(clock, timestamp),
        None => TimeController::new(clock),
    }
}

fn record_pool_gauges(pool: &TransactionPool) {
    MEMPOOL_PENDING.set(pool.pending_count() as f64);
    MEMPOOL_QUEUED.set(pool.queued_count() as f64);
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("chain_id", &self.chain_id)
            .field("hardfork", &self.resolver.hardfork())
            .field("fork_block_number", &self.resolver.fork_block_number())
            .finish()
    }
}
