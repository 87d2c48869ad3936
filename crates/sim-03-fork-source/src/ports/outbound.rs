//! Outbound (Driven) ports for the fork data source.

use async_trait::async_trait;
use shared_types::{AccountInfo, Address, Block, Hash, Receipt, U256};

use crate::domain::ProviderFailure;

/// Historical query interface of a remote chain.
///
/// Every method is idempotent for a fixed block, which is what makes the
/// responses cacheable.
#[async_trait]
pub trait RemoteProvider: Send + Sync {
    /// Chain id of the remote chain.
    async fn chain_id(&self) -> Result<u64, ProviderFailure>;

    /// Current head of the remote chain.
    async fn latest_block_number(&self) -> Result<u64, ProviderFailure>;

    /// Block by number, `None` if the remote does not have it.
    async fn get_block_by_number(&self, number: u64) -> Result<Option<Block>, ProviderFailure>;

    /// Receipt by transaction hash, `None` if unknown.
    async fn get_transaction_receipt(&self, hash: Hash) -> Result<Option<Receipt>, ProviderFailure>;

    /// Account nonce, balance and code hash at `block_number`.
    async fn get_account_state(
        &self,
        address: Address,
        block_number: u64,
    ) -> Result<AccountInfo, ProviderFailure>;

    /// Storage slot value at `block_number`.
    async fn get_storage_at(
        &self,
        address: Address,
        slot: U256,
        block_number: u64,
    ) -> Result<U256, ProviderFailure>;
}

/// Remote method names, used in cache keys, metrics and errors.
pub mod methods {
    /// Chain id query
    pub const CHAIN_ID: &str = "chainId";
    /// Head block number query
    pub const BLOCK_NUMBER: &str = "blockNumber";
    /// Block by number
    pub const GET_BLOCK_BY_NUMBER: &str = "getBlockByNumber";
    /// Receipt by transaction hash
    pub const GET_TRANSACTION_RECEIPT: &str = "getTransactionReceipt";
    /// Account nonce, balance and code hash
    pub const GET_ACCOUNT_STATE: &str = "getAccountState";
    /// Storage slot
    pub const GET_STORAGE_AT: &str = "getStorageAt";
}
