//! # Forking Scenarios
//!
//! A node pinned to a remote mainnet block:
//!
//! - Blocks, receipts and account state at or below the fork block come
//!   from the remote chain, each fetched once
//! - Local blocks extend the fork block
//! - Responses at a safe depth survive in the disk cache

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use node_runtime::NodeError;
    use shared_types::{AccountInfo, Receipt, U256};
    use sim_02_hardfork::Hardfork;
    use sim_03_fork_source::{methods, ForkConfig, ForkError, InMemoryRemoteProvider};
    use sim_04_mempool::TxClass;

    use crate::integration::fixtures::*;

    const GWEI: u64 = 1_000_000_000;
    const REMOTE_TX: [u8; 32] = [0x11; 32];
    const LATE_TX: [u8; 32] = [0x22; 32];

    fn remote_receipt(hash: [u8; 32], block_number: u64) -> Receipt {
        Receipt {
            transaction_hash: hash,
            transaction_index: 0,
            block_number,
            block_hash: [0x33; 32],
            from: BOB,
            to: Some(CAROL),
            gas_used: 21_000,
            cumulative_gas_used: 21_000,
            effective_gas_price: U256::from(30 * GWEI),
            success: true,
        }
    }

    fn provider() -> Arc<InMemoryRemoteProvider> {
        Arc::new(
            InMemoryRemoteProvider::new(1, REMOTE_HEAD)
                .with_block(remote_block(FORK, Some(U256::from(20 * GWEI))))
                .with_block(remote_block(REMOTE_HEAD - 64, Some(U256::from(20 * GWEI))))
                .with_block(remote_block(12_000_000, None))
                .with_account(ALICE, 14_000_000, AccountInfo {
                    nonce: 3,
                    balance: ether(50),
                    code_hash: None,
                })
                .with_receipt(remote_receipt(REMOTE_TX, FORK - 10))
                .with_receipt(remote_receipt(LATE_TX, FORK + 50)),
        )
    }

    async fn mainnet_node(provider: &Arc<InMemoryRemoteProvider>) -> node_runtime::Node {
        forked_node(fork_config(Hardfork::London, pinned(FORK)), provider)
            .await
            .unwrap()
    }

    // =============================================================================
    // SCENARIOS: CONNECTION
    // =============================================================================

    #[tokio::test]
    async fn test_fork_pins_remote_block() {
        let provider = provider();
        let node = mainnet_node(&provider).await;

        assert_eq!(node.chain_id(), 1);
        assert_eq!(node.fork_block_number(), Some(FORK));
        assert_eq!(node.latest_block_number().await.unwrap(), FORK);

        let pinned_block = node.get_block_by_number(FORK).await.unwrap().unwrap();
        assert_eq!(pinned_block.hash(), remote_block(FORK, Some(U256::from(20 * GWEI))).hash());

        let snapshot = node.snapshot().await.unwrap();
        assert_eq!(snapshot.chain_id, 1);
        assert_eq!(snapshot.fork_block_number, Some(FORK));
    }

    #[tokio::test]
    async fn test_recommended_fork_block() {
        let provider = provider();
        let config = fork_config(Hardfork::London, ForkConfig::default());
        let node = forked_node(config, &provider).await.unwrap();
        assert_eq!(node.fork_block_number(), Some(REMOTE_HEAD - 64));
    }

    #[tokio::test]
    async fn test_fork_block_above_head() {
        let provider = provider();
        let err = forked_node(fork_config(Hardfork::London, pinned(REMOTE_HEAD + 1)), &provider)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            NodeError::Fork(ForkError::InvalidForkBlock {
                requested,
                latest: REMOTE_HEAD
            }) if requested == REMOTE_HEAD + 1
        ));
    }

    #[tokio::test]
    async fn test_missing_fork_block() {
        let provider = provider();
        let err = forked_node(fork_config(Hardfork::London, pinned(FORK + 1)), &provider)
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::ForkBlockNotFound(n) if n == FORK + 1));
    }

    // =============================================================================
    // SCENARIOS: REMOTE READS
    // =============================================================================

    #[tokio::test]
    async fn test_remote_blocks_fetched_once() {
        let provider = provider();
        let node = mainnet_node(&provider).await;
        let after_connect = provider.call_count(methods::GET_BLOCK_BY_NUMBER);

        node.get_block_by_number(FORK).await.unwrap().unwrap();
        node.get_block_by_number(12_000_000).await.unwrap().unwrap();
        node.get_block_by_number(12_000_000).await.unwrap().unwrap();
        assert_eq!(provider.call_count(methods::GET_BLOCK_BY_NUMBER), after_connect + 1);

        // Above the fork only local blocks exist.
        assert!(node.get_block_by_number(FORK + 1).await.unwrap().is_none());
        assert_eq!(provider.call_count(methods::GET_BLOCK_BY_NUMBER), after_connect + 1);
    }

    #[tokio::test]
    async fn test_remote_receipts() {
        let provider = provider();
        let node = mainnet_node(&provider).await;

        let receipt = node.get_transaction_receipt(REMOTE_TX).await.unwrap().unwrap();
        assert_eq!(receipt.block_number, FORK - 10);
        node.get_transaction_receipt(REMOTE_TX).await.unwrap().unwrap();
        assert_eq!(provider.call_count(methods::GET_TRANSACTION_RECEIPT), 1);

        // Mined after the fork block on the remote chain: invisible here.
        assert!(node.get_transaction_receipt(LATE_TX).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remote_account_state_loaded_once() {
        let provider = provider();
        let node = mainnet_node(&provider).await;

        assert_eq!(node.get_account_balance(ALICE).await.unwrap(), ether(50));
        let loads = provider.call_count(methods::GET_ACCOUNT_STATE);
        assert_eq!(node.get_account_balance(ALICE).await.unwrap(), ether(50));
        assert_eq!(node.get_account_balance_at(ALICE, FORK).await.unwrap(), ether(50));
        assert_eq!(provider.call_count(methods::GET_ACCOUNT_STATE), loads);

        // Genesis accounts do not apply to a forked node.
        assert_eq!(node.get_account_balance(BOB).await.unwrap(), U256::zero());
    }

    #[tokio::test]
    async fn test_provider_failure_surfaces() {
        let provider = provider();
        let node = mainnet_node(&provider).await;

        provider.fail_with("connection reset");
        // Cached responses are still served.
        assert!(node.get_block_by_number(FORK).await.unwrap().is_some());

        let err = node.get_block_by_number(12_000_000).await.unwrap_err();
        assert!(matches!(err, NodeError::Fork(ForkError::Provider { .. })));

        let err = node.get_account_balance(CAROL).await.unwrap_err();
        assert!(matches!(err, NodeError::Fork(ForkError::Provider { .. })));

        let err = node
            .send_transaction(legacy(ALICE, 3, 21_000, 30 * GWEI))
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::Fork(ForkError::Provider { .. })));
        assert!(node.get_pending_transactions().await.is_empty());

        provider.recover();
        assert!(node.get_block_by_number(12_000_000).await.unwrap().is_some());
        node.send_transaction(legacy(ALICE, 3, 21_000, 30 * GWEI))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_provider_failure_during_mining_keeps_pool() {
        let provider = provider();
        let node = mainnet_node(&provider).await;

        // The sender is loaded on admission, the recipient only on execution.
        let tx = legacy(ALICE, 3, 21_000, 30 * GWEI);
        node.send_transaction(tx.clone()).await.unwrap();

        provider.fail_with("connection reset");
        let err = node.mine_block(None).await.unwrap_err();
        assert!(matches!(err, NodeError::Fork(ForkError::Provider { .. })));
        assert_eq!(node.latest_block_number().await.unwrap(), FORK);
        assert_eq!(node.get_pending_transactions().await, vec![tx.clone()]);

        provider.recover();
        let outcome = node.mine_block(None).await.unwrap();
        assert_eq!(outcome.block.header.number, FORK + 1);
        assert_eq!(outcome.included(), vec![tx.hash()]);
        assert!(node.get_pending_transactions().await.is_empty());
    }

    // =============================================================================
    // SCENARIOS: LOCAL BLOCKS
    // =============================================================================

    #[tokio::test]
    async fn test_mining_extends_fork_block() {
        let provider = provider();
        let node = mainnet_node(&provider).await;
        let fork_block = node.get_block_by_number(FORK).await.unwrap().unwrap();

        let admission = node
            .send_transaction(legacy(ALICE, 3, 21_000, 30 * GWEI))
            .await
            .unwrap();
        assert_eq!(admission.class, TxClass::Pending);

        let outcome = node.mine_block(None).await.unwrap();
        assert_eq!(outcome.block.number(), FORK + 1);
        assert_eq!(outcome.block.header.parent_hash, fork_block.hash());
        // A half-full parent keeps the base fee unchanged.
        assert_eq!(outcome.block.header.base_fee_per_gas, Some(U256::from(20 * GWEI)));
        assert_eq!(outcome.included(), vec![admission.hash]);

        let fee = U256::from(21_000u64) * U256::from(30 * GWEI);
        assert_eq!(
            node.get_account_balance(ALICE).await.unwrap(),
            ether(50) - U256::from(1_000u64) - fee
        );
        assert_eq!(node.get_account_balance_at(ALICE, FORK).await.unwrap(), ether(50));
        assert!(node.get_block_by_number(FORK + 1).await.unwrap().is_some());
        assert!(node
            .get_transaction_receipt(admission.hash)
            .await
            .unwrap()
            .is_some());
    }

    // =============================================================================
    // SCENARIOS: DISK CACHE
    // =============================================================================

    #[tokio::test]
    async fn test_disk_cache_shared_across_nodes() {
        let dir = tempfile::tempdir().unwrap();
        let fork = ForkConfig {
            cache_dir: Some(dir.path().to_path_buf()),
            ..pinned(FORK)
        };

        let first = provider();
        let node = forked_node(fork_config(Hardfork::London, fork.clone()), &first)
            .await
            .unwrap();
        assert!(node.fork_source().unwrap().is_persistent());
        node.get_block_by_number(12_000_000).await.unwrap().unwrap();
        drop(node);

        let second = provider();
        let node = forked_node(fork_config(Hardfork::London, fork), &second)
            .await
            .unwrap();
        node.get_block_by_number(12_000_000).await.unwrap().unwrap();
        assert_eq!(second.call_count(methods::GET_BLOCK_BY_NUMBER), 0);
    }

    #[tokio::test]
    async fn test_unsafe_fork_block_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(
            InMemoryRemoteProvider::new(1, FORK + 10)
                .with_block(remote_block(FORK, Some(U256::from(20 * GWEI)))),
        );
        let fork = ForkConfig {
            cache_dir: Some(dir.path().to_path_buf()),
            ..pinned(FORK)
        };
        let node = forked_node(fork_config(Hardfork::London, fork), &provider)
            .await
            .unwrap();
        assert!(!node.fork_source().unwrap().is_persistent());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
