//! In-memory remote chain.
//!
//! Serves a fixed set of historical blocks, receipts and account states and
//! counts the calls it receives, so tests can observe what the cache saves.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shared_types::{AccountInfo, Address, Block, Hash, Receipt, U256};

use crate::domain::ProviderFailure;
use crate::ports::{methods, RemoteProvider};

#[derive(Default)]
struct RemoteChain {
    latest_block_number: u64,
    blocks: BTreeMap<u64, Block>,
    receipts: HashMap<Hash, Receipt>,
    accounts: HashMap<Address, BTreeMap<u64, AccountInfo>>,
    storage: HashMap<(Address, U256), BTreeMap<u64, U256>>,
}

/// A remote chain held in memory.
pub struct InMemoryRemoteProvider {
    chain_id: u64,
    chain: RwLock<RemoteChain>,
    calls: Mutex<HashMap<&'static str, usize>>,
    failure: RwLock<Option<String>>,
}

fn at_or_before<T: Clone>(history: Option<&BTreeMap<u64, T>>, block_number: u64) -> Option<T> {
    history?
        .range(..=block_number)
        .next_back()
        .map(|(_, value)| value.clone())
}

impl InMemoryRemoteProvider {
    /// Creates an empty chain with the given head.
    pub fn new(chain_id: u64, latest_block_number: u64) -> Self {
        Self {
            chain_id,
            chain: RwLock::new(RemoteChain {
                latest_block_number,
                ..RemoteChain::default()
            }),
            calls: Mutex::new(HashMap::new()),
            failure: RwLock::new(None),
        }
    }

    /// Adds a block.
    pub fn with_block(self, block: Block) -> Self {
        self.chain.write().blocks.insert(block.number(), block);
        self
    }

    /// Adds a receipt.
    pub fn with_receipt(self, receipt: Receipt) -> Self {
        self.chain
            .write()
            .receipts
            .insert(receipt.transaction_hash, receipt);
        self
    }

    /// Records an account state effective from `block_number` on.
    pub fn with_account(self, address: Address, block_number: u64, info: AccountInfo) -> Self {
        self.chain
            .write()
            .accounts
            .entry(address)
            .or_default()
            .insert(block_number, info);
        self
    }

    /// Records a storage value effective from `block_number` on.
    pub fn with_storage(self, address: Address, slot: U256, block_number: u64, value: U256) -> Self {
        self.chain
            .write()
            .storage
            .entry((address, slot))
            .or_default()
            .insert(block_number, value);
        self
    }

    /// Moves the remote head.
    pub fn set_latest_block_number(&self, latest_block_number: u64) {
        self.chain.write().latest_block_number = latest_block_number;
    }

    /// Makes every subsequent call fail with `reason`.
    pub fn fail_with(&self, reason: impl Into<String>) {
        *self.failure.write() = Some(reason.into());
    }

    /// Clears an injected failure.
    pub fn recover(&self) {
        *self.failure.write() = None;
    }

    /// Number of calls received for `method`.
    pub fn call_count(&self, method: &str) -> usize {
        self.calls.lock().get(method).copied().unwrap_or(0)
    }

    /// Number of calls received across all methods.
    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }

    fn record(&self, method: &'static str) -> Result<(), ProviderFailure> {
        *self.calls.lock().entry(method).or_insert(0) += 1;
        match self.failure.read().as_ref() {
            Some(reason) => Err(ProviderFailure::new(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteProvider for InMemoryRemoteProvider {
    async fn chain_id(&self) -> Result<u64, ProviderFailure> {
        self.record(methods::CHAIN_ID)?;
        Ok(self.chain_id)
    }

    async fn latest_block_number(&self) -> Result<u64, ProviderFailure> {
        self.record(methods::BLOCK_NUMBER)?;
        Ok(self.chain.read().latest_block_number)
    }

    async fn get_block_by_number(&self, number: u64) -> Result<Option<Block>, ProviderFailure> {
        self.record(methods::GET_BLOCK_BY_NUMBER)?;
        Ok(self.chain.read().blocks.get(&number).cloned())
    }

    async fn get_transaction_receipt(&self, hash: Hash) -> Result<Option<Receipt>, ProviderFailure> {
        self.record(methods::GET_TRANSACTION_RECEIPT)?;
        Ok(self.chain.read().receipts.get(&hash).cloned())
    }

    async fn get_account_state(
        &self,
        address: Address,
        block_number: u64,
    ) -> Result<AccountInfo, ProviderFailure> {
        self.record(methods::GET_ACCOUNT_STATE)?;
        let chain = self.chain.read();
        Ok(at_or_before(chain.accounts.get(&address), block_number).unwrap_or_default())
    }

    async fn get_storage_at(
        &self,
        address: Address,
        slot: U256,
        block_number: u64,
    ) -> Result<U256, ProviderFailure> {
        self.record(methods::GET_STORAGE_AT)?;
        let chain = self.chain.read();
        Ok(at_or_before(chain.storage.get(&(address, slot)), block_number).unwrap_or_default())
    }
}
