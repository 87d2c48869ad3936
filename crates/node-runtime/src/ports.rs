//! Outbound ports of the node.

use async_trait::async_trait;
use shared_types::{Block, Hash, Receipt, StoreError};

/// Port: Persistent chain of blocks and receipts.
#[async_trait]
pub trait BlockchainStore: Send + Sync {
    /// Appends a block; its number must follow the latest one.
    async fn put_block(&self, block: Block, receipts: Vec<Receipt>) -> Result<(), StoreError>;

    /// Block by number, `NotFound` if absent.
    async fn get_block_by_number(&self, number: u64) -> Result<Block, StoreError>;

    /// Number of the latest block.
    async fn get_latest_block_number(&self) -> Result<u64, StoreError>;

    /// The latest block.
    async fn get_latest_block(&self) -> Result<Block, StoreError>;

    /// Receipt of a locally mined transaction.
    async fn get_receipt(&self, hash: Hash) -> Result<Option<Receipt>, StoreError>;
}
