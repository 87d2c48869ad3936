//! Fork data source: cached access to a remote chain pinned at a fork block.

use std::future::Future;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use shared_types::{format_address, format_hash, AccountInfo, Address, Block, Hash, Receipt, U256};
use sim_telemetry::{FORK_CACHE_HITS, FORK_CACHE_MISSES, FORK_REMOTE_FETCHES};
use tracing::{debug, info, instrument, warn};

use crate::config::{recommended_fork_block_number, safe_block_depth, ForkConfig};
use crate::domain::{CacheKey, ForkCache, ForkError, ProviderFailure};
use crate::ports::{methods, RemoteProvider};

/// Serves historical blocks, receipts and state of the remote chain.
///
/// Every query is answered from the cache when possible; misses are fetched
/// once and stored. Blocks above the pinned fork block belong to the local
/// chain and are refused.
pub struct ForkDataSource {
    provider: Arc<dyn RemoteProvider>,
    cache: ForkCache,
    chain_id: u64,
    fork_block_number: u64,
    persist: bool,
}

impl ForkDataSource {
    /// Connects to the remote chain and pins the fork block.
    ///
    /// Disk persistence is only enabled when the fork block is at least the
    /// chain's safe depth behind the remote head.
    pub async fn connect(
        provider: Arc<dyn RemoteProvider>,
        config: &ForkConfig,
    ) -> Result<Self, ForkError> {
        let chain_id = provider
            .chain_id()
            .await
            .map_err(|e| ForkError::provider(methods::CHAIN_ID, e))?;
        let latest = provider
            .latest_block_number()
            .await
            .map_err(|e| ForkError::provider(methods::BLOCK_NUMBER, e))?;

        let fork_block_number = match config.block_number {
            Some(requested) if requested > latest => {
                return Err(ForkError::InvalidForkBlock { requested, latest });
            }
            Some(requested) => requested,
            None => recommended_fork_block_number(chain_id, latest),
        };

        let depth = safe_block_depth(chain_id);
        let is_safe = latest - fork_block_number >= depth;
        if !is_safe {
            warn!(
                chain_id,
                fork_block_number,
                latest,
                safe_depth = depth,
                "Fork block is within the reorg-unsafe range; responses will not be persisted"
            );
        }

        let cache = match &config.cache_dir {
            Some(dir) => ForkCache::with_disk(dir),
            None => ForkCache::in_memory(),
        };
        let persist = is_safe && cache.disk_dir().is_some();

        info!(
            url = %config.url,
            chain_id,
            fork_block_number,
            latest,
            persist,
            "Fork data source connected"
        );

        Ok(Self {
            provider,
            cache,
            chain_id,
            fork_block_number,
            persist,
        })
    }

    /// Remote chain id.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Pinned fork block.
    pub fn fork_block_number(&self) -> u64 {
        self.fork_block_number
    }

    /// Whether responses are written to disk.
    pub fn is_persistent(&self) -> bool {
        self.persist
    }

    /// Number of responses held in memory.
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// Block `number` of the remote chain.
    #[instrument(skip(self), fields(chain_id = self.chain_id))]
    pub async fn get_block_by_number(&self, number: u64) -> Result<Option<Block>, ForkError> {
        self.ensure_pinned(methods::GET_BLOCK_BY_NUMBER, number)?;
        self.cached(methods::GET_BLOCK_BY_NUMBER, json!([number]), || {
            self.provider.get_block_by_number(number)
        })
        .await
    }

    /// Receipt of a remote transaction.
    ///
    /// Receipts of transactions mined after the fork block do not exist from
    /// the node's point of view: they are reported as not found and not cached.
    #[instrument(skip(self, hash), fields(chain_id = self.chain_id, hash = %format_hash(&hash)))]
    pub async fn get_transaction_receipt(&self, hash: Hash) -> Result<Option<Receipt>, ForkError> {
        let method = methods::GET_TRANSACTION_RECEIPT;
        let key = self.key(method, &json!([format_hash(&hash)]));

        if let Some(receipt) = self.lookup::<Receipt>(&key) {
            return Ok(Some(receipt));
        }

        let receipt = self.fetch(method, self.provider.get_transaction_receipt(hash)).await?;
        match receipt {
            Some(receipt) if receipt.block_number <= self.fork_block_number => {
                self.store(key, &receipt);
                Ok(Some(receipt))
            }
            Some(receipt) => {
                debug!(
                    block_number = receipt.block_number,
                    fork_block_number = self.fork_block_number,
                    "Receipt above fork block ignored"
                );
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Account state at `block_number`.
    pub async fn get_account_state(
        &self,
        address: Address,
        block_number: u64,
    ) -> Result<AccountInfo, ForkError> {
        self.ensure_pinned(methods::GET_ACCOUNT_STATE, block_number)?;
        let args = json!([format_address(&address), block_number]);
        let info = self
            .cached(methods::GET_ACCOUNT_STATE, args, || async move {
                self.provider
                    .get_account_state(address, block_number)
                    .await
                    .map(Some)
            })
            .await?;
        Ok(info.unwrap_or_default())
    }

    /// Storage slot at `block_number`.
    pub async fn get_storage_at(
        &self,
        address: Address,
        slot: U256,
        block_number: u64,
    ) -> Result<U256, ForkError> {
        self.ensure_pinned(methods::GET_STORAGE_AT, block_number)?;
        let args = json!([format_address(&address), format!("{:#x}", slot), block_number]);
        let value = self
            .cached(methods::GET_STORAGE_AT, args, || async move {
                self.provider
                    .get_storage_at(address, slot, block_number)
                    .await
                    .map(Some)
            })
            .await?;
        Ok(value.unwrap_or_default())
    }

    fn ensure_pinned(&self, method: &str, block_number: u64) -> Result<(), ForkError> {
        if block_number > self.fork_block_number {
            return Err(ForkError::BlockAboveFork {
                method: method.to_string(),
                block_number,
                fork_block_number: self.fork_block_number,
            });
        }
        Ok(())
    }

    fn key(&self, method: &str, args: &Value) -> CacheKey {
        CacheKey::new(self.chain_id, self.fork_block_number, method, args)
    }

    fn lookup<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let value = self.cache.get(key, self.persist)?;
        match serde_json::from_value(value) {
            Ok(decoded) => {
                FORK_CACHE_HITS.inc();
                Some(decoded)
            }
            Err(e) => {
                warn!(error = %e, "Fork cache entry has unexpected shape, refetching");
                None
            }
        }
    }

    fn store<T: Serialize>(&self, key: CacheKey, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Response not cacheable");
                return;
            }
        };
        // The memory entry is kept even if the disk write fails.
        if let Err(e) = self.cache.insert(key, value, self.persist) {
            warn!(error = %e, "Fork cache write failed");
        }
    }

    async fn fetch<T>(
        &self,
        method: &'static str,
        request: impl Future<Output = Result<T, ProviderFailure>>,
    ) -> Result<T, ForkError> {
        FORK_CACHE_MISSES.inc();
        FORK_REMOTE_FETCHES.with_label_values(&[method]).inc();
        debug!(method, "Fetching from remote provider");
        request.await.map_err(|e| {
            warn!(method, error = %e, "Remote provider request failed");
            ForkError::provider(method, e)
        })
    }

    /// Cache-or-fetch for responses that are final below the fork block.
    /// `None` responses are returned but not stored.
    async fn cached<T, F, Fut>(
        &self,
        method: &'static str,
        args: Value,
        request: F,
    ) -> Result<Option<T>, ForkError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, ProviderFailure>>,
    {
        let key = self.key(method, &args);
        if let Some(hit) = self.lookup::<T>(&key) {
            return Ok(Some(hit));
        }

        let response = self.fetch(method, request()).await?;
        if let Some(value) = &response {
            self.store(key, value);
        }
        Ok(response)
    }
}

impl std::fmt::Debug for ForkDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForkDataSource")
            .field("chain_id", &self.chain_id)
            .field("fork_block_number", &self.fork_block_number)
            .field("persist", &self.persist)
            .finish()
    }
}
