//! Block builder service
//!
//! Drives one build attempt against the execution engine: opens a pending
//! block, feeds it the best-priced sender heads that fit the remaining gas
//! budget, settles the reward and seals the header.

use crate::{
    config::BuilderConfig,
    domain::{
        calculate_block_reward, calculate_next_base_fee, invariants, BuildOutcome, BuildRequest,
        CandidateQueue, DroppedTransaction, SkipReason, SkippedTransaction,
    },
    error::{BlockBuildError, Result},
    metrics::Metrics,
    ports::{EngineError, ExecutionEngine, ExecutionResult},
};
use shared_types::{
    format_hash, transactions_root, Address, Block, BlockContext, BlockHeader, Receipt, U256,
};
use sim_04_mempool::PoolEntry;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Builds blocks from the pool's pending runs.
pub struct BlockBuilder {
    /// Execution engine owning state
    engine: Arc<dyn ExecutionEngine>,

    /// Builder configuration
    config: BuilderConfig,

    /// Build counters
    metrics: Arc<Metrics>,
}

impl BlockBuilder {
    /// Create a new block builder
    pub fn new(engine: Arc<dyn ExecutionEngine>, config: BuilderConfig) -> Self {
        Self {
            engine,
            config,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Builder configuration
    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Shared handle to the build counters
    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    /// Base fee of the requested block, `None` before the fee market.
    pub fn base_fee_for(&self, request: &BuildRequest) -> Option<U256> {
        if !request.hardfork.supports_fee_market() {
            return None;
        }
        if let Some(fee) = request.base_fee_override {
            return Some(fee);
        }
        Some(match request.parent.base_fee_per_gas {
            Some(parent_fee) => calculate_next_base_fee(
                request.parent.gas_used,
                request.parent.gas_limit,
                parent_fee,
            ),
            None => U256::from(self.config.initial_base_fee_per_gas),
        })
    }

    /// Builds one block.
    ///
    /// On error the engine's pending block is discarded. On success the
    /// engine still holds the pending block; the caller commits it once the
    /// block is persisted.
    #[instrument(
        skip(self, request, pending),
        fields(number = request.number(), gas_limit = request.gas_limit, hardfork = %request.hardfork)
    )]
    pub async fn build(
        &self,
        request: BuildRequest,
        pending: BTreeMap<Address, Vec<PoolEntry>>,
    ) -> Result<BuildOutcome> {
        let number = request.number();
        let base_fee = self.base_fee_for(&request);
        let context = BlockContext {
            number,
            timestamp: request.timestamp,
            coinbase: request.coinbase,
            gas_limit: request.gas_limit,
            base_fee_per_gas: base_fee,
        };

        debug!(
            senders = pending.len(),
            base_fee = ?base_fee,
            "Starting block build"
        );

        self.engine
            .begin_block(&context)
            .await
            .map_err(|source| BlockBuildError::engine(number, source))?;

        let mut queue = CandidateQueue::new(pending, base_fee);
        let mut skipped = Vec::new();
        let mut dropped = Vec::new();
        let mut included: Vec<(PoolEntry, ExecutionResult)> = Vec::new();
        let mut remaining = request.gas_limit;
        let mut gas_used = 0u64;
        let mut priority_fees = U256::zero();
        let mut burned = U256::zero();

        collect_unpayable(&mut queue, &mut skipped);

        while let Some(entry) = queue.pop() {
            if entry.gas_limit > remaining {
                debug!(
                    hash = %format_hash(&entry.hash),
                    gas_limit = entry.gas_limit,
                    remaining,
                    "Candidate does not fit remaining gas"
                );
                skipped.push(SkippedTransaction {
                    hash: entry.hash,
                    sender: entry.sender,
                    reason: SkipReason::ExceedsRemainingGas {
                        gas_limit: entry.gas_limit,
                        remaining,
                    },
                });
                queue.block(entry.sender);
                continue;
            }

            match self
                .engine
                .execute_transaction(&entry.transaction, &context, request.hardfork)
                .await
            {
                Ok(result) => {
                    remaining = remaining.saturating_sub(result.gas_used);
                    gas_used = gas_used.saturating_add(result.gas_used);

                    let gas = U256::from(result.gas_used);
                    let tip = entry
                        .transaction
                        .priority_fee_per_gas(base_fee)
                        .unwrap_or_default();
                    priority_fees = priority_fees.saturating_add(tip.saturating_mul(gas));
                    burned = burned.saturating_add(base_fee.unwrap_or_default().saturating_mul(gas));

                    queue.accept(entry.sender);
                    collect_unpayable(&mut queue, &mut skipped);
                    included.push((entry, result));
                }
                Err(EngineError::Transaction { reason }) => {
                    warn!(
                        hash = %format_hash(&entry.hash),
                        nonce = entry.nonce,
                        %reason,
                        "Dropping transaction rejected by engine"
                    );
                    queue.block(entry.sender);
                    dropped.push(DroppedTransaction {
                        hash: entry.hash,
                        sender: entry.sender,
                        nonce: entry.nonce,
                        reason,
                    });
                }
                Err(EngineError::Fatal(reason)) => {
                    error!(
                        hash = %format_hash(&entry.hash),
                        %reason,
                        "Engine failure, aborting block build"
                    );
                    return self
                        .abort(BlockBuildError::TransactionExecution {
                            hash: entry.hash,
                            sender: entry.sender,
                            nonce: entry.nonce,
                            reason,
                        })
                        .await;
                }
                Err(EngineError::Fork(source)) => {
                    error!(
                        hash = %format_hash(&entry.hash),
                        error = %source,
                        "Fork data unavailable, aborting block build"
                    );
                    return self
                        .abort(BlockBuildError::Fork {
                            block_number: number,
                            source,
                        })
                        .await;
                }
            }
        }

        let reward = calculate_block_reward(request.hardfork, priority_fees);
        let state_root = match self.engine.finalize_block(request.coinbase, reward).await {
            Ok(root) => root,
            Err(source) => {
                return self
                    .abort(BlockBuildError::engine(number, source))
                    .await
            }
        };

        let transactions: Vec<_> = included.iter().map(|(e, _)| e.transaction.clone()).collect();
        let hashes: Vec<_> = included.iter().map(|(e, _)| e.hash).collect();
        let block = Block {
            header: BlockHeader {
                number,
                parent_hash: request.parent.hash(),
                timestamp: request.timestamp,
                gas_limit: request.gas_limit,
                gas_used,
                coinbase: request.coinbase,
                base_fee_per_gas: base_fee,
                state_root,
                transactions_root: transactions_root(&hashes),
            },
            transactions,
        };

        if let Err(err) = invariants::check_all(&block) {
            return self.abort(err).await;
        }

        let receipts = build_receipts(&block, &included, base_fee);

        self.metrics.record_block_built(included.len(), gas_used);
        self.metrics.record_rejections(dropped.len(), skipped.len());
        self.metrics.record_priority_fees(priority_fees);

        info!(
            number,
            transactions = included.len(),
            gas_used,
            dropped = dropped.len(),
            skipped = skipped.len(),
            "Block built"
        );

        Ok(BuildOutcome {
            block,
            receipts,
            dropped,
            skipped,
            reward,
            burned,
        })
    }

    async fn abort<T>(&self, err: BlockBuildError) -> Result<T> {
        self.engine.discard_block().await;
        Err(err)
    }
}

fn collect_unpayable(queue: &mut CandidateQueue, skipped: &mut Vec<SkippedTransaction>) {
    for entry in queue.take_unpayable() {
        debug!(hash = %format_hash(&entry.hash), "Candidate cannot pay base fee");
        skipped.push(SkippedTransaction {
            hash: entry.hash,
            sender: entry.sender,
            reason: SkipReason::BelowBaseFee,
        });
    }
}

fn build_receipts(
    block: &Block,
    included: &[(PoolEntry, ExecutionResult)],
    base_fee: Option<U256>,
) -> Vec<Receipt> {
    let block_hash = block.hash();
    let mut cumulative = 0u64;
    included
        .iter()
        .enumerate()
        .map(|(index, (entry, result))| {
            cumulative += result.gas_used;
            Receipt {
                transaction_hash: entry.hash,
                transaction_index: index as u64,
                block_number: block.number(),
                block_hash,
                from: entry.sender,
                to: entry.transaction.to,
                gas_used: result.gas_used,
                cumulative_gas_used: cumulative,
                effective_gas_price: entry.effective_gas_price(base_fee).unwrap_or_default(),
                success: result.success,
            }
        })
        .collect()
}
