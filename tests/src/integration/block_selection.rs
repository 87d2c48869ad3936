//! # Block Selection Scenarios
//!
//! Gas-budget-aware selection across senders:
//!
//! - A candidate is only included if its declared gas limit fits the budget
//!   left at selection time; the budget shrinks by actual gas used
//! - Higher effective price first, earlier arrival breaks ties
//! - A skipped head blocks the rest of its sender's run for that block

#[cfg(test)]
mod tests {
    use shared_types::Hash;
    use sim_02_hardfork::Hardfork;
    use sim_05_block_builder::SkipReason;

    use crate::integration::fixtures::*;

    // =============================================================================
    // SCENARIOS: GAS BUDGET
    // =============================================================================

    /// Two 30k-limit transfers from one sender fit a 55k block because each
    /// only uses 21k; a third sender's 40k-limit transfer does not.
    #[tokio::test]
    async fn test_actual_gas_frees_budget_for_same_sender() {
        let node = node(Hardfork::London, 55_000).await;
        let a0 = node.send_transaction(legacy(ALICE, 0, 30_000, 2_000_000_000)).await.unwrap().hash;
        let a1 = node.send_transaction(legacy(ALICE, 1, 30_000, 2_000_000_000)).await.unwrap().hash;
        let b0 = node.send_transaction(legacy(BOB, 0, 40_000, 2_000_000_000)).await.unwrap().hash;

        let outcome = node.mine_block(None).await.unwrap();

        assert_eq!(outcome.included(), vec![a0, a1]);
        assert_eq!(outcome.block.header.gas_used, 42_000);
        let pooled: Vec<Hash> = node
            .get_pending_transactions()
            .await
            .iter()
            .map(|tx| tx.hash())
            .collect();
        assert_eq!(pooled, vec![b0]);
    }

    /// Price 40 beats price 20, but once the first 40 is in, its sibling no
    /// longer fits and the cheaper 21k transfer from another sender does.
    #[tokio::test]
    async fn test_cheaper_sender_fills_remaining_budget() {
        let node = node(Hardfork::Berlin, 50_000).await;
        let a0 = node.send_transaction(legacy(ALICE, 0, 30_000, 40)).await.unwrap().hash;
        let a1 = node.send_transaction(legacy(ALICE, 1, 30_000, 40)).await.unwrap().hash;
        let b0 = node.send_transaction(legacy(BOB, 0, 21_000, 20)).await.unwrap().hash;

        let outcome = node.mine_block(None).await.unwrap();

        assert_eq!(outcome.included(), vec![a0, b0]);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].hash, a1);
        assert_eq!(
            outcome.skipped[0].reason,
            SkipReason::ExceedsRemainingGas {
                gas_limit: 30_000,
                remaining: 29_000
            }
        );

        // The skipped transaction stays pooled and pending.
        let snapshot = node.snapshot().await.unwrap();
        assert_eq!(snapshot.pool.pending, 1);
        let alice = snapshot.pool.sender(&ALICE).unwrap();
        assert_eq!(alice.account_nonce, 1);
        assert_eq!(alice.pending_nonces, vec![1]);

        let next = node.mine_block(None).await.unwrap();
        assert_eq!(next.included(), vec![a1]);
    }

    #[tokio::test]
    async fn test_empty_pool_mines_empty_block() {
        let node = node(Hardfork::London, 30_000_000).await;
        let before = node.latest_block_number().await.unwrap();

        let outcome = node.mine_block(None).await.unwrap();

        assert!(outcome.block.transactions.is_empty());
        assert_eq!(outcome.block.header.gas_used, 0);
        assert_eq!(node.latest_block_number().await.unwrap(), before + 1);
        let parent = node.get_block_by_number(before).await.unwrap().unwrap();
        assert_eq!(outcome.block.header.parent_hash, parent.hash());
    }

    #[tokio::test]
    async fn test_gas_used_never_exceeds_limit() {
        let node = node(Hardfork::Berlin, 100_000).await;
        for nonce in 0..5 {
            for sender in [ALICE, BOB, CAROL] {
                node.send_transaction(legacy(sender, nonce, 25_000 + nonce * 1_000, 1 + nonce))
                    .await
                    .unwrap();
            }
        }

        let mut mined = 0;
        while !node.get_pending_transactions().await.is_empty() {
            let outcome = node.mine_block(None).await.unwrap();
            assert!(outcome.block.header.gas_used <= 100_000);
            assert!(!outcome.block.transactions.is_empty());
            mined += outcome.block.transactions.len();
        }
        assert_eq!(mined, 15);
    }

    // =============================================================================
    // SCENARIOS: POOL UPDATES
    // =============================================================================

    #[tokio::test]
    async fn test_mining_removes_exactly_included() {
        let node = node(Hardfork::Berlin, 50_000).await;
        node.send_transaction(legacy(ALICE, 0, 21_000, 5)).await.unwrap();
        node.send_transaction(legacy(ALICE, 2, 21_000, 5)).await.unwrap();
        node.send_transaction(legacy(BOB, 0, 21_000, 1)).await.unwrap();
        node.send_transaction(legacy(CAROL, 0, 21_000, 3)).await.unwrap();

        let outcome = node.mine_block(None).await.unwrap();
        assert_eq!(outcome.block.transactions.len(), 2);

        let snapshot = node.snapshot().await.unwrap();
        // ALICE 0 and CAROL 0 were mined; ALICE 2 stays queued behind the gap.
        assert_eq!(snapshot.pool.pending, 1);
        assert_eq!(snapshot.pool.queued, 1);
        assert_eq!(snapshot.pool.sender(&ALICE).unwrap().queued_nonces, vec![2]);
        assert_eq!(snapshot.pool.sender(&BOB).unwrap().pending_nonces, vec![0]);
        assert!(snapshot.pool.senders.iter().all(|run| run.is_contiguous()));
    }

    #[tokio::test]
    async fn test_gap_fill_after_mining_promotes_queued() {
        let node = node(Hardfork::Berlin, 30_000_000).await;
        node.send_transaction(legacy(ALICE, 0, 21_000, 1)).await.unwrap();
        node.send_transaction(legacy(ALICE, 2, 21_000, 1)).await.unwrap();
        node.mine_block(None).await.unwrap();

        let admission = node.send_transaction(legacy(ALICE, 1, 21_000, 1)).await.unwrap();
        assert_eq!(admission.promoted, 1);

        let outcome = node.mine_block(None).await.unwrap();
        let nonces: Vec<u64> = outcome.block.transactions.iter().map(|tx| tx.nonce).collect();
        assert_eq!(nonces, vec![1, 2]);
    }

    /// Lowering the limit does not evict; the transaction waits for a block
    /// large enough to hold it.
    #[tokio::test]
    async fn test_lowered_gas_limit_skips_without_evicting() {
        let node = node(Hardfork::Berlin, 55_000).await;
        let big = node.send_transaction(legacy(ALICE, 0, 40_000, 1)).await.unwrap().hash;

        node.set_block_gas_limit(30_000).await.unwrap();
        let outcome = node.mine_block(None).await.unwrap();
        assert!(outcome.block.transactions.is_empty());
        assert_eq!(node.get_pending_transactions().await.len(), 1);

        node.set_block_gas_limit(55_000).await.unwrap();
        let outcome = node.mine_block(None).await.unwrap();
        assert_eq!(outcome.included(), vec![big]);
    }

    #[tokio::test]
    async fn test_below_base_fee_waits() {
        let node = node(Hardfork::London, 30_000_000).await;
        node.set_next_block_base_fee(shared_types::U256::from(100u64)).await.unwrap();
        let cheap = node.send_transaction(fee_market(ALICE, 0, 21_000, 50, 1)).await.unwrap().hash;

        let outcome = node.mine_block(None).await.unwrap();
        assert!(outcome.block.transactions.is_empty());
        assert_eq!(outcome.skipped[0].reason, SkipReason::BelowBaseFee);

        // Base fee decays block after block until the transaction is payable.
        let mut included = false;
        for _ in 0..10 {
            if node.mine_block(None).await.unwrap().included() == vec![cheap] {
                included = true;
                break;
            }
        }
        assert!(included);
    }
}
