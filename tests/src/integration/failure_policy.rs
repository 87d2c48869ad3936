//! # Failure Policy Scenarios
//!
//! How a block build reacts to engine failures:
//!
//! - A transaction-level rejection drops that transaction from the pool and
//!   the block carries on without it; it is never retried on its own
//! - An engine-level failure aborts the whole block; chain, state and pool
//!   stay exactly as they were

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use node_runtime::adapters::{InMemoryBlockchain, InMemoryExecutionEngine};
    use node_runtime::container::GenesisAccount;
    use node_runtime::{Node, NodeError};
    use parking_lot::Mutex;
    use shared_types::{
        AccountInfo, Address, BlockContext, CallOutcome, CallParams, Hash, SignedTransaction,
        TransactionFee, U256,
    };
    use sim_01_time_control::ManualClock;
    use sim_02_hardfork::Hardfork;
    use sim_05_block_builder::{BlockBuildError, EngineError, ExecutionEngine, ExecutionResult};

    use crate::integration::fixtures::*;

    const POOR: Address = [0x50; 20];

    // =============================================================================
    // TEST ENGINE
    // =============================================================================

    /// Delegates to the in-memory engine but fails hard on one hash.
    struct PoisonedEngine {
        inner: Arc<InMemoryExecutionEngine>,
        poison: Mutex<Option<Hash>>,
    }

    #[async_trait]
    impl ExecutionEngine for PoisonedEngine {
        async fn get_account(&self, address: Address) -> Result<AccountInfo, EngineError> {
            self.inner.get_account(address).await
        }

        async fn get_account_at(
            &self,
            address: Address,
            block_number: u64,
        ) -> Result<AccountInfo, EngineError> {
            self.inner.get_account_at(address, block_number).await
        }

        async fn begin_block(&self, context: &BlockContext) -> Result<(), EngineError> {
            self.inner.begin_block(context).await
        }

        async fn execute_transaction(
            &self,
            tx: &SignedTransaction,
            context: &BlockContext,
            hardfork: Hardfork,
        ) -> Result<ExecutionResult, EngineError> {
            if *self.poison.lock() == Some(tx.hash()) {
                return Err(EngineError::Fatal("state backend unavailable".into()));
            }
            self.inner.execute_transaction(tx, context, hardfork).await
        }

        async fn finalize_block(&self, coinbase: Address, reward: U256) -> Result<Hash, EngineError> {
            self.inner.finalize_block(coinbase, reward).await
        }

        async fn commit_block(&self) -> Result<(), EngineError> {
            self.inner.commit_block().await
        }

        async fn discard_block(&self) {
            self.inner.discard_block().await
        }

        async fn run_call(
            &self,
            params: &CallParams,
            context: &BlockContext,
            hardfork: Hardfork,
        ) -> Result<CallOutcome, EngineError> {
            self.inner.run_call(params, context, hardfork).await
        }
    }

    fn transfer(from: Address, to: Address, nonce: u64, value: U256) -> SignedTransaction {
        SignedTransaction {
            to: Some(to),
            value,
            fee: TransactionFee::Legacy {
                gas_price: U256::one(),
            },
            ..legacy(from, nonce, 21_000, 1)
        }
    }

    // =============================================================================
    // SCENARIOS: TRANSACTION-LEVEL REJECTION
    // =============================================================================

    /// POOR can afford either transfer alone but not both; the second one is
    /// dropped at execution time.
    #[tokio::test]
    async fn test_rejected_transaction_is_dropped_and_not_retried() {
        let mut config = config(Hardfork::Berlin, 30_000_000);
        config.genesis_accounts.push(GenesisAccount {
            address: POOR,
            balance: U256::from(1_000_000u64),
        });
        let (node, _clock) = node_with_clock(config).await;

        let first = transfer(POOR, DAVE, 0, U256::from(600_000u64));
        let second = transfer(POOR, DAVE, 1, U256::from(600_000u64));
        node.send_transaction(first.clone()).await.unwrap();
        node.send_transaction(second.clone()).await.unwrap();

        let outcome = node.mine_block(None).await.unwrap();
        assert_eq!(outcome.included(), vec![first.hash()]);
        assert_eq!(outcome.dropped_hashes(), vec![second.hash()]);
        assert!(outcome.dropped[0].reason.contains("insufficient funds"));

        assert!(node.get_pending_transactions().await.is_empty());
        assert!(node.get_transaction_receipt(second.hash()).await.unwrap().is_none());
        assert_eq!(
            node.get_account_balance(POOR).await.unwrap(),
            U256::from(1_000_000u64 - 600_000 - 21_000)
        );

        // Nothing brings the dropped transaction back on its own.
        let outcome = node.mine_block(None).await.unwrap();
        assert!(outcome.block.transactions.is_empty());

        // Once funded, an explicit resubmission goes through.
        node.send_transaction(transfer(BOB, POOR, 0, ether(1))).await.unwrap();
        node.mine_block(None).await.unwrap();
        node.send_transaction(second.clone()).await.unwrap();
        let outcome = node.mine_block(None).await.unwrap();
        assert_eq!(outcome.included(), vec![second.hash()]);
        assert!(node.get_transaction_receipt(second.hash()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_drop_resyncs_sender_nonce() {
        let mut config = config(Hardfork::Berlin, 30_000_000);
        config.genesis_accounts.push(GenesisAccount {
            address: POOR,
            balance: U256::from(1_000_000u64),
        });
        let (node, _clock) = node_with_clock(config).await;

        node.send_transaction(transfer(POOR, DAVE, 0, U256::from(600_000u64)))
            .await
            .unwrap();
        node.send_transaction(transfer(POOR, DAVE, 1, U256::from(600_000u64)))
            .await
            .unwrap();
        node.mine_block(None).await.unwrap();

        let snapshot = node.snapshot().await.unwrap();
        assert_eq!(snapshot.pool.pending + snapshot.pool.queued, 0);

        // A cheap replacement at nonce 1 is pending straight away.
        let admission = node
            .send_transaction(transfer(POOR, DAVE, 1, U256::from(1_000u64)))
            .await
            .unwrap();
        assert_eq!(admission.class, sim_04_mempool::TxClass::Pending);
    }

    // =============================================================================
    // SCENARIOS: ENGINE-LEVEL FAILURE
    // =============================================================================

    #[tokio::test]
    async fn test_fatal_failure_aborts_block_atomically() {
        let inner = Arc::new(InMemoryExecutionEngine::new());
        inner.fund(ALICE, ether(100));
        inner.fund(BOB, ether(100));
        let engine = Arc::new(PoisonedEngine {
            inner: Arc::clone(&inner),
            poison: Mutex::new(None),
        });
        let node = Node::standalone(
            config(Hardfork::Berlin, 30_000_000),
            Arc::new(ManualClock::new(START)),
            engine.clone(),
            Arc::new(InMemoryBlockchain::new()),
        )
        .await
        .unwrap();

        let good = legacy(ALICE, 0, 21_000, 9);
        let bad = legacy(BOB, 0, 21_000, 1);
        node.send_transaction(good.clone()).await.unwrap();
        node.send_transaction(bad.clone()).await.unwrap();
        *engine.poison.lock() = Some(bad.hash());
        let root_before = inner.state_root();

        let err = node.mine_block(None).await.unwrap_err();
        match err {
            NodeError::Build(BlockBuildError::TransactionExecution { hash, sender, .. }) => {
                assert_eq!(hash, bad.hash());
                assert_eq!(sender, BOB);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // The transaction that executed before the failure left no trace.
        assert_eq!(node.latest_block_number().await.unwrap(), 0);
        assert_eq!(node.get_pending_transactions().await.len(), 2);
        assert_eq!(node.get_account_balance(ALICE).await.unwrap(), ether(100));
        assert_eq!(inner.state_root(), root_before);
        assert!(!inner.has_pending_block());
        assert_eq!(node.snapshot().await.unwrap().time.offset_seconds, 0);

        *engine.poison.lock() = None;
        let outcome = node.mine_block(None).await.unwrap();
        assert_eq!(outcome.included(), vec![good.hash(), bad.hash()]);
        assert!(node.get_pending_transactions().await.is_empty());
    }
}
