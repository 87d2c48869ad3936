//! # In-Memory Blockchain Store
//!
//! Reference `BlockchainStore` keeping blocks and receipts in memory.
//!
//! The first stored block may have any number (a forked chain starts at the
//! pinned remote block); every later block must extend the tip.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{Block, Hash, Receipt, StoreError};
use tracing::debug;

use crate::ports::BlockchainStore;

#[derive(Default)]
struct Chain {
    blocks: BTreeMap<u64, Block>,
    receipts: HashMap<Hash, Receipt>,
}

/// Blocks by number plus a receipt index.
#[derive(Default)]
pub struct InMemoryBlockchain {
    chain: RwLock<Chain>,
}

impl InMemoryBlockchain {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blocks.
    pub fn len(&self) -> usize {
        self.chain.read().blocks.len()
    }

    /// True if no block has been stored.
    pub fn is_empty(&self) -> bool {
        self.chain.read().blocks.is_empty()
    }
}

#[async_trait]
impl BlockchainStore for InMemoryBlockchain {
    async fn put_block(&self, block: Block, receipts: Vec<Receipt>) -> Result<(), StoreError> {
        let mut chain = self.chain.write();
        let number = block.number();
        if let Some((&latest, _)) = chain.blocks.last_key_value() {
            if number != latest + 1 {
                return Err(StoreError::NonSequentialBlock { number, latest });
            }
        }
        for receipt in receipts {
            chain.receipts.insert(receipt.transaction_hash, receipt);
        }
        chain.blocks.insert(number, block);
        debug!(number, "Block stored");
        Ok(())
    }

    async fn get_block_by_number(&self, number: u64) -> Result<Block, StoreError> {
        self.chain
            .read()
            .blocks
            .get(&number)
            .cloned()
            .ok_or(StoreError::NotFound(number))
    }

    async fn get_latest_block_number(&self) -> Result<u64, StoreError> {
        self.chain
            .read()
            .blocks
            .last_key_value()
            .map(|(number, _)| *number)
            .ok_or_else(|| StoreError::Backend("chain is empty".to_string()))
    }

    async fn get_latest_block(&self) -> Result<Block, StoreError> {
        self.chain
            .read()
            .blocks
            .last_key_value()
            .map(|(_, block)| block.clone())
            .ok_or_else(|| StoreError::Backend("chain is empty".to_string()))
    }

    async fn get_receipt(&self, hash: Hash) -> Result<Option<Receipt>, StoreError> {
        Ok(self.chain.read().receipts.get(&hash).cloned())
    }
}
