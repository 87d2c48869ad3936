//! # Test Fixtures
//!
//! Accounts, transaction builders and node constructors shared by the
//! scenario tests.

use std::sync::Arc;

use node_runtime::container::GenesisAccount;
use node_runtime::{Node, NodeConfig, NodeError};
use shared_types::{
    Address, Block, BlockHeader, SignedTransaction, TransactionFee, U256, ONE_ETHER, ZERO_HASH,
};
use sim_01_time_control::ManualClock;
use sim_02_hardfork::Hardfork;
use sim_03_fork_source::{ForkConfig, InMemoryRemoteProvider};

/// Wall-clock time the manual clock starts at.
pub const START: u64 = 1_700_000_000;

/// First funded sender.
pub const ALICE: Address = [0xA1; 20];
/// Second funded sender.
pub const BOB: Address = [0xB0; 20];
/// Third funded sender.
pub const CAROL: Address = [0xCA; 20];
/// Unfunded recipient.
pub const DAVE: Address = [0xDA; 20];
/// Block beneficiary.
pub const MINER: Address = [0xEE; 20];

/// `n` ether in wei.
pub fn ether(n: u64) -> U256 {
    U256::from(ONE_ETHER) * U256::from(n)
}

/// Configuration with ALICE, BOB and CAROL holding 100 ETH each.
pub fn config(hardfork: Hardfork, block_gas_limit: u64) -> NodeConfig {
    NodeConfig {
        hardfork,
        block_gas_limit,
        coinbase: MINER,
        initial_timestamp: Some(START),
        genesis_accounts: [ALICE, BOB, CAROL]
            .into_iter()
            .map(|address| GenesisAccount {
                address,
                balance: ether(100),
            })
            .collect(),
        ..NodeConfig::for_testing()
    }
}

/// Standalone node on a manual clock; returns the clock for time travel.
pub async fn node_with_clock(config: NodeConfig) -> (Node, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(START));
    let node = Node::with_clock(config, clock.clone())
        .await
        .expect("node construction");
    (node, clock)
}

/// Standalone node on a manual clock.
pub async fn node(hardfork: Hardfork, block_gas_limit: u64) -> Node {
    node_with_clock(config(hardfork, block_gas_limit)).await.0
}

/// Legacy transfer of 1,000 wei to DAVE.
pub fn legacy(from: Address, nonce: u64, gas_limit: u64, gas_price: u64) -> SignedTransaction {
    SignedTransaction {
        from,
        to: Some(DAVE),
        value: U256::from(1_000u64),
        nonce,
        gas_limit,
        fee: TransactionFee::Legacy {
            gas_price: U256::from(gas_price),
        },
        data: vec![],
        signature: [0u8; 65],
    }
}

/// Fee-market transfer to DAVE.
pub fn fee_market(
    from: Address,
    nonce: u64,
    gas_limit: u64,
    max_fee: u64,
    max_priority_fee: u64,
) -> SignedTransaction {
    SignedTransaction {
        fee: TransactionFee::FeeMarket {
            max_fee_per_gas: U256::from(max_fee),
            max_priority_fee_per_gas: U256::from(max_priority_fee),
        },
        ..legacy(from, nonce, gas_limit, 0)
    }
}

// =============================================================================
// REMOTE CHAIN
// =============================================================================

/// Mainnet block the forked scenarios pin.
pub const FORK: u64 = 15_000_000;

/// Remote head used by the forked scenarios.
pub const REMOTE_HEAD: u64 = FORK + 100;

/// Empty remote block, half full, stamped well before `START`.
pub fn remote_block(number: u64, base_fee_per_gas: Option<U256>) -> Block {
    Block {
        header: BlockHeader {
            number,
            parent_hash: [0x0F; 32],
            timestamp: START - 10_000,
            gas_limit: 30_000_000,
            gas_used: 15_000_000,
            coinbase: [0x77; 20],
            base_fee_per_gas,
            state_root: [0x55; 32],
            transactions_root: ZERO_HASH,
        },
        transactions: vec![],
    }
}

/// Configuration forking the remote chain under `fork`.
pub fn fork_config(hardfork: Hardfork, fork: ForkConfig) -> NodeConfig {
    NodeConfig {
        fork: Some(fork),
        ..config(hardfork, 30_000_000)
    }
}

/// Pins `block_number`, without a disk cache.
pub fn pinned(block_number: u64) -> ForkConfig {
    ForkConfig {
        url: "memory://remote".into(),
        block_number: Some(block_number),
        cache_dir: None,
    }
}

/// Forked node on a manual clock.
pub async fn forked_node(
    config: NodeConfig,
    provider: &Arc<InMemoryRemoteProvider>,
) -> Result<Node, NodeError> {
    Node::fork(config, provider.clone(), Arc::new(ManualClock::new(START))).await
}
