//! # Hardfork Scenarios
//!
//! Ruleset selection per block: the configured hardfork for local blocks,
//! activation histories for blocks older than the fork point.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use node_runtime::NodeError;
    use shared_types::{AccountInfo, CallParams, U256};
    use sim_02_hardfork::{Activation, ChainConfig, Feature, Hardfork, HardforkError};
    use sim_03_fork_source::InMemoryRemoteProvider;

    use crate::integration::fixtures::*;

    const DEVNET: u64 = 999;
    const GWEI: u64 = 1_000_000_000;

    fn fee_market_call() -> CallParams {
        CallParams {
            from: Some(ALICE),
            to: Some(DAVE),
            max_fee_per_gas: Some(U256::from(100 * GWEI)),
            max_priority_fee_per_gas: Some(U256::from(GWEI)),
            ..CallParams::default()
        }
    }

    fn legacy_call() -> CallParams {
        CallParams {
            from: Some(ALICE),
            to: Some(DAVE),
            ..CallParams::default()
        }
    }

    fn not_activated(hardfork: Hardfork) -> HardforkError {
        HardforkError::FeatureNotActivated {
            feature: Feature::FeeMarket,
            hardfork,
            activated_in: Hardfork::London,
        }
    }

    fn mainnet_provider() -> Arc<InMemoryRemoteProvider> {
        Arc::new(
            InMemoryRemoteProvider::new(1, REMOTE_HEAD)
                .with_block(remote_block(FORK, Some(U256::from(20 * GWEI))))
                .with_block(remote_block(12_000_000, None))
                .with_block(remote_block(12_965_000, Some(U256::from(GWEI))))
                .with_account(ALICE, 0, AccountInfo {
                    nonce: 0,
                    balance: ether(5),
                    code_hash: None,
                }),
        )
    }

    fn devnet_provider() -> Arc<InMemoryRemoteProvider> {
        Arc::new(
            InMemoryRemoteProvider::new(DEVNET, 1_000)
                .with_block(remote_block(60, None))
                .with_block(remote_block(90, Some(U256::from(GWEI))))
                .with_block(remote_block(100, Some(U256::from(GWEI)))),
        )
    }

    fn devnet_history() -> ChainConfig {
        ChainConfig {
            chain_id: DEVNET,
            name: "devnet".into(),
            hardfork_history: vec![
                Activation {
                    block_number: 0,
                    hardfork: Hardfork::Byzantium,
                },
                Activation {
                    block_number: 50,
                    hardfork: Hardfork::Berlin,
                },
                Activation {
                    block_number: 80,
                    hardfork: Hardfork::London,
                },
            ],
        }
    }

    // =============================================================================
    // SCENARIOS: CONFIGURED RULESET
    // =============================================================================

    #[tokio::test]
    async fn test_pre_london_node_refuses_fee_market() {
        let node = node(Hardfork::Berlin, 30_000_000).await;
        let expected = NodeError::Hardfork(not_activated(Hardfork::Berlin));

        let err = node
            .send_transaction(fee_market(ALICE, 0, 21_000, 100, 1))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), expected.to_string());
        assert!(node.get_pending_transactions().await.is_empty());

        let err = node.run_call(fee_market_call(), None).await.unwrap_err();
        assert!(matches!(err, NodeError::Hardfork(HardforkError::FeatureNotActivated { .. })));

        let err = node.set_next_block_base_fee(U256::one()).await.unwrap_err();
        assert!(matches!(err, NodeError::Hardfork(HardforkError::FeatureNotActivated { .. })));

        assert!(node.run_call(legacy_call(), None).await.unwrap().success);
        let outcome = node.mine_block(None).await.unwrap();
        assert_eq!(outcome.block.header.base_fee_per_gas, None);
    }

    #[tokio::test]
    async fn test_london_node_accepts_fee_market() {
        let node = node(Hardfork::London, 30_000_000).await;
        let call = node.run_call(fee_market_call(), None).await.unwrap();
        assert!(call.success);
        assert_eq!(call.gas_used, 21_000);

        let outcome = node.mine_block(None).await.unwrap();
        assert!(outcome.block.header.base_fee_per_gas.is_some());
        let call = node.run_call(fee_market_call(), Some(1)).await.unwrap();
        assert!(call.success);
    }

    // =============================================================================
    // SCENARIOS: HISTORICAL BLOCKS
    // =============================================================================

    /// Mainnet history is built in: block 12,000,000 predates London.
    #[tokio::test]
    async fn test_mainnet_history_applies_below_fork() {
        let provider = mainnet_provider();
        let node = forked_node(fork_config(Hardfork::Shanghai, pinned(FORK)), &provider)
            .await
            .unwrap();

        let err = node
            .run_call(fee_market_call(), Some(12_000_000))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            NodeError::Hardfork(not_activated(Hardfork::MuirGlacier)).to_string()
        );

        assert!(node.run_call(legacy_call(), Some(12_000_000)).await.unwrap().success);
        assert!(node.run_call(fee_market_call(), Some(12_965_000)).await.unwrap().success);
    }

    #[tokio::test]
    async fn test_configured_history_for_other_chain() {
        let provider = devnet_provider();
        let mut config = fork_config(Hardfork::London, pinned(100));
        config.chains = vec![devnet_history()];
        let node = forked_node(config, &provider).await.unwrap();
        assert_eq!(node.chain_id(), DEVNET);

        let err = node.run_call(fee_market_call(), Some(60)).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            NodeError::Hardfork(not_activated(Hardfork::Berlin)).to_string()
        );
        assert!(node.run_call(fee_market_call(), Some(90)).await.unwrap().success);
    }

    #[tokio::test]
    async fn test_unknown_history_fails_only_for_old_blocks() {
        let provider = devnet_provider();
        let node = forked_node(fork_config(Hardfork::London, pinned(100)), &provider)
            .await
            .unwrap();

        let err = node.run_call(legacy_call(), Some(90)).await.unwrap_err();
        assert!(matches!(
            err,
            NodeError::Hardfork(HardforkError::UnknownHistoricalHardfork {
                chain_id: DEVNET,
                block_number: 90,
                fork_block_number: 100
            })
        ));

        // Local blocks run under the configured ruleset.
        let outcome = node.mine_block(None).await.unwrap();
        assert_eq!(outcome.block.number(), 101);
        assert!(outcome.block.header.base_fee_per_gas.is_some());
        assert!(node.run_call(fee_market_call(), Some(101)).await.unwrap().success);
        assert!(node.run_call(fee_market_call(), None).await.unwrap().success);
    }

    #[tokio::test]
    async fn test_refuses_fork_before_spurious_dragon() {
        let provider = Arc::new(
            InMemoryRemoteProvider::new(1, 2_000_100).with_block(remote_block(2_000_000, None)),
        );
        let err = forked_node(fork_config(Hardfork::London, pinned(2_000_000)), &provider)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            NodeError::Hardfork(HardforkError::UnsupportedForkHardfork {
                chain_id: 1,
                fork_block_number: 2_000_000,
                hardfork: Hardfork::Dao
            })
        ));
    }
}
