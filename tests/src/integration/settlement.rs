//! # Settlement Scenarios
//!
//! Receipts, balance movements and miner rewards of mined blocks.

#[cfg(test)]
mod tests {
    use shared_types::U256;
    use sim_02_hardfork::Hardfork;

    use crate::integration::fixtures::*;

    const GWEI: u64 = 1_000_000_000;

    #[tokio::test]
    async fn test_legacy_transfer_pays_miner_full_price() {
        let node = node(Hardfork::Byzantium, 30_000_000).await;
        let hash = node
            .send_transaction(legacy(ALICE, 0, 21_000, 10 * GWEI))
            .await
            .unwrap()
            .hash;

        let outcome = node.mine_block(None).await.unwrap();

        let fee = U256::from(21_000u64) * U256::from(10 * GWEI);
        assert_eq!(outcome.burned, U256::zero());
        assert_eq!(outcome.reward, ether(3) + fee);
        assert_eq!(node.get_account_balance(MINER).await.unwrap(), ether(3) + fee);
        assert_eq!(node.get_account_balance(DAVE).await.unwrap(), U256::from(1_000u64));
        assert_eq!(
            node.get_account_balance(ALICE).await.unwrap(),
            ether(100) - U256::from(1_000u64) - fee
        );

        let receipt = node.get_transaction_receipt(hash).await.unwrap().unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.block_number, 1);
        assert_eq!(receipt.block_hash, outcome.block.hash());
        assert_eq!(receipt.gas_used, 21_000);
        assert_eq!(receipt.effective_gas_price, U256::from(10 * GWEI));
        assert_eq!(receipt.from, ALICE);
        assert_eq!(receipt.to, Some(DAVE));
    }

    /// Under London the base fee is burned and only the tip reaches the miner.
    #[tokio::test]
    async fn test_fee_market_transfer_burns_base_fee() {
        let node = node(Hardfork::London, 30_000_000).await;
        node.send_transaction(fee_market(ALICE, 0, 21_000, 10 * GWEI, 2 * GWEI))
            .await
            .unwrap();

        let outcome = node.mine_block(None).await.unwrap();
        let base_fee = outcome.block.header.base_fee_per_gas.unwrap();
        let gas = U256::from(21_000u64);
        let tip = U256::from(2 * GWEI);

        assert_eq!(outcome.burned, gas * base_fee);
        assert_eq!(outcome.reward, ether(2) + gas * tip);
        assert_eq!(node.get_account_balance(MINER).await.unwrap(), ether(2) + gas * tip);
        assert_eq!(
            node.get_account_balance(ALICE).await.unwrap(),
            ether(100) - U256::from(1_000u64) - gas * (base_fee + tip)
        );
        assert_eq!(outcome.receipts[0].effective_gas_price, base_fee + tip);
    }

    #[tokio::test]
    async fn test_post_merge_blocks_carry_no_subsidy() {
        let node = node(Hardfork::Shanghai, 30_000_000).await;
        let outcome = node.mine_block(None).await.unwrap();
        assert_eq!(outcome.reward, U256::zero());
        assert_eq!(node.get_account_balance(MINER).await.unwrap(), U256::zero());
    }

    #[tokio::test]
    async fn test_receipts_accumulate_gas_in_block_order() {
        let node = node(Hardfork::Berlin, 30_000_000).await;
        let first = node.send_transaction(legacy(ALICE, 0, 21_000, 9)).await.unwrap().hash;
        let second = node.send_transaction(legacy(BOB, 0, 21_000, 5)).await.unwrap().hash;

        let outcome = node.mine_block(None).await.unwrap();
        assert_eq!(outcome.included(), vec![first, second]);

        let r1 = node.get_transaction_receipt(first).await.unwrap().unwrap();
        let r2 = node.get_transaction_receipt(second).await.unwrap().unwrap();
        assert_eq!((r1.transaction_index, r1.cumulative_gas_used), (0, 21_000));
        assert_eq!((r2.transaction_index, r2.cumulative_gas_used), (1, 42_000));
        assert_eq!(outcome.block.header.gas_used, 42_000);
    }

    #[tokio::test]
    async fn test_unknown_receipt_is_none() {
        let node = node(Hardfork::London, 30_000_000).await;
        assert!(node.get_transaction_receipt([0x42; 32]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_historical_balances() {
        let node = node(Hardfork::Berlin, 30_000_000).await;
        node.send_transaction(legacy(ALICE, 0, 21_000, 1)).await.unwrap();
        node.mine_block(None).await.unwrap();
        node.send_transaction(legacy(ALICE, 1, 21_000, 1)).await.unwrap();
        node.mine_block(None).await.unwrap();

        assert_eq!(node.get_account_balance_at(DAVE, 0).await.unwrap(), U256::zero());
        assert_eq!(node.get_account_balance_at(DAVE, 1).await.unwrap(), U256::from(1_000u64));
        assert_eq!(node.get_account_balance_at(DAVE, 2).await.unwrap(), U256::from(2_000u64));
        assert_eq!(node.get_account_balance_at(ALICE, 0).await.unwrap(), ether(100));
        assert!(node.get_account_balance_at(DAVE, 3).await.is_err());
    }
}
