//! # Transaction Pool - Nonce Sequencing and Classification
//!
//! ## Data Structures
//!
//! - `by_hash`: O(1) lookup by transaction hash
//! - `by_sender`: nonce-ordered transactions per account plus the account's
//!   last known on-chain nonce
//!
//! ## Invariants Enforced
//!
//! - No duplicate hashes (checked in `add()`)
//! - At most one transaction per (sender, nonce); a second one must win the
//!   replacement check
//! - Per sender, pending nonces form a gap-free run starting at the on-chain
//!   nonce; everything after the first gap is queued (`reclassify()`)

use super::entities::{
    AccountInfo, Address, Arrival, Hash, MempoolConfig, PoolEntry, SignedTransaction, TxClass,
};
use super::errors::MempoolError;
use super::services::{classify_nonces, is_valid_replacement};
use super::value_objects::{Admission, MempoolStatus, PoolSnapshot, SenderRun};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Per-sender bookkeeping.
#[derive(Debug, Default)]
struct SenderQueue {
    /// Last on-chain nonce reported for the sender.
    account_nonce: u64,
    /// Pooled transactions by nonce.
    txs: BTreeMap<u64, Hash>,
}

/// Transaction pool with pending/queued classification.
///
/// The pool never executes anything. It holds transactions until the block
/// builder consumes the pending set, and is told afterwards which ones were
/// mined (`on_block_mined`) or dropped (`drop_transaction`).
#[derive(Debug)]
pub struct TransactionPool {
    /// Configuration.
    config: MempoolConfig,

    /// All transactions indexed by hash.
    by_hash: HashMap<Hash, PoolEntry>,

    /// Transactions grouped by sender, ordered by nonce.
    by_sender: HashMap<Address, SenderQueue>,

    /// Next arrival sequence number.
    next_arrival: Arrival,
}

impl TransactionPool {
    /// Creates a new empty transaction pool.
    pub fn new(config: MempoolConfig) -> Self {
        Self {
            config,
            by_hash: HashMap::new(),
            by_sender: HashMap::new(),
            next_arrival: 0,
        }
    }

    /// Returns the current configuration.
    pub fn config(&self) -> &MempoolConfig {
        &self.config
    }

    /// Block gas limit used by admission checks.
    pub fn block_gas_limit(&self) -> u64 {
        self.config.block_gas_limit
    }

    /// Updates the block gas limit for future admissions.
    ///
    /// Already pooled transactions above the new limit stay; the builder
    /// skips them when they do not fit.
    pub fn set_block_gas_limit(&mut self, limit: u64) {
        debug!(old = self.config.block_gas_limit, new = limit, "Block gas limit updated");
        self.config.block_gas_limit = limit;
    }

    /// Returns the number of transactions in the pool.
    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    /// Returns true if the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    /// Returns the number of pending transactions.
    pub fn pending_count(&self) -> usize {
        self.by_hash.values().filter(|e| e.is_pending()).count()
    }

    /// Returns the number of queued transactions.
    pub fn queued_count(&self) -> usize {
        self.by_hash.values().filter(|e| e.is_queued()).count()
    }

    /// Gets a transaction by hash.
    pub fn get(&self, hash: &Hash) -> Option<&PoolEntry> {
        self.by_hash.get(hash)
    }

    /// Checks if a transaction exists in the pool.
    pub fn contains(&self, hash: &Hash) -> bool {
        self.by_hash.contains_key(hash)
    }

    /// Last on-chain nonce reported for `sender`, if it has pooled transactions.
    pub fn account_nonce(&self, sender: &Address) -> Option<u64> {
        self.by_sender.get(sender).map(|q| q.account_nonce)
    }

    /// Entries of one sender in ascending nonce order.
    pub fn sender_entries(&self, sender: &Address) -> Vec<&PoolEntry> {
        self.by_sender
            .get(sender)
            .map(|queue| {
                queue
                    .txs
                    .values()
                    .filter_map(|hash| self.by_hash.get(hash))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Adds a transaction to the pool.
    ///
    /// `account` is the execution engine's current view of the sender.
    ///
    /// # Errors
    /// - `AlreadyKnown` if the hash is already pooled
    /// - `NonceTooLow` if the nonce was already used on chain
    /// - `GasLimitExceedsBlockLimit` if it could never fit in a block
    /// - `IntrinsicGasTooLow` if the gas limit does not cover the intrinsic cost
    /// - `InsufficientFunds` if value plus max gas cost exceeds the balance
    /// - `ReplacementUnderpriced` if the nonce is taken and the fee bump is too small
    /// - `PoolFull` if at capacity
    pub fn add(
        &mut self,
        tx: SignedTransaction,
        account: &AccountInfo,
    ) -> Result<Admission, MempoolError> {
        let hash = tx.hash();
        let sender = tx.sender();

        if self.by_hash.contains_key(&hash) {
            return Err(MempoolError::AlreadyKnown(hash));
        }

        if tx.nonce < account.nonce {
            return Err(MempoolError::NonceTooLow {
                sender,
                expected: account.nonce,
                actual: tx.nonce,
            });
        }

        if tx.gas_limit > self.config.block_gas_limit {
            return Err(MempoolError::GasLimitExceedsBlockLimit {
                hash,
                gas_limit: tx.gas_limit,
                block_gas_limit: self.config.block_gas_limit,
            });
        }

        let intrinsic = tx.intrinsic_gas();
        if tx.gas_limit < intrinsic {
            return Err(MempoolError::IntrinsicGasTooLow {
                hash,
                gas_limit: tx.gas_limit,
                intrinsic,
            });
        }

        let required = tx.max_cost();
        if required > account.balance {
            return Err(MempoolError::InsufficientFunds {
                sender,
                required,
                available: account.balance,
            });
        }

        let existing = self
            .by_sender
            .get(&sender)
            .and_then(|q| q.txs.get(&tx.nonce))
            .copied();

        match existing.and_then(|h| self.by_hash.get(&h)) {
            Some(old) => {
                if !is_valid_replacement(&old.transaction, &tx, self.config.replacement_bump_percent)
                {
                    return Err(MempoolError::ReplacementUnderpriced {
                        existing: old.hash,
                        old_price: old.transaction.max_fee_per_gas(),
                        new_price: tx.max_fee_per_gas(),
                        min_bump_percent: self.config.replacement_bump_percent,
                    });
                }
            }
            None => {
                if self.by_hash.len() >= self.config.max_transactions {
                    return Err(MempoolError::PoolFull {
                        capacity: self.config.max_transactions,
                    });
                }
            }
        }

        // All checks passed; mutate from here on.
        if let Some(old_hash) = existing {
            self.by_hash.remove(&old_hash);
            debug!(
                old = %shared_types::format_hash(&old_hash),
                new = %shared_types::format_hash(&hash),
                nonce = tx.nonce,
                "Replaced pooled transaction"
            );
        }

        let arrival = self.next_arrival;
        self.next_arrival += 1;

        let nonce = tx.nonce;
        let queue = self.by_sender.entry(sender).or_default();
        queue.account_nonce = queue.account_nonce.max(account.nonce);
        queue.txs.insert(nonce, hash);
        self.by_hash.insert(hash, PoolEntry::new(tx, arrival));

        self.prune_stale(&sender);
        let reclassified = self.reclassify(&sender);
        let class = self
            .by_hash
            .get(&hash)
            .map(|e| e.class)
            .unwrap_or(TxClass::Queued);
        // The new entry starts queued; only count the others.
        let promoted = reclassified.saturating_sub(usize::from(class == TxClass::Pending));

        debug!(
            hash = %shared_types::format_hash(&hash),
            sender = %shared_types::format_address(&sender),
            nonce,
            ?class,
            "Transaction admitted"
        );

        Ok(Admission {
            hash,
            class,
            replaced: existing,
            promoted,
        })
    }

    /// Pending entries grouped by sender, each in ascending nonce order.
    pub fn pending_by_sender(&self) -> BTreeMap<Address, Vec<PoolEntry>> {
        let mut grouped = BTreeMap::new();
        for (sender, queue) in &self.by_sender {
            let run: Vec<PoolEntry> = queue
                .txs
                .values()
                .filter_map(|hash| self.by_hash.get(hash))
                .take_while(|e| e.is_pending())
                .cloned()
                .collect();
            if !run.is_empty() {
                grouped.insert(*sender, run);
            }
        }
        grouped
    }

    /// All pooled entries in arrival order.
    pub fn all(&self) -> Vec<&PoolEntry> {
        let mut entries: Vec<_> = self.by_hash.values().collect();
        entries.sort_by_key(|e| e.arrival);
        entries
    }

    /// Pending entries in arrival order.
    pub fn pending(&self) -> Vec<&PoolEntry> {
        self.all().into_iter().filter(|e| e.is_pending()).collect()
    }

    /// Queued entries in arrival order.
    pub fn queued(&self) -> Vec<&PoolEntry> {
        self.all().into_iter().filter(|e| e.is_queued()).collect()
    }

    /// Removes a transaction that was included in a block.
    ///
    /// The sender's on-chain nonce moves past the removed nonce, so the next
    /// queued entry becomes the new pending head when it is contiguous.
    pub fn remove(&mut self, hash: &Hash) -> Result<PoolEntry, MempoolError> {
        let entry = self.remove_internal(hash)?;
        if let Some(queue) = self.by_sender.get_mut(&entry.sender) {
            queue.account_nonce = queue.account_nonce.max(entry.nonce + 1);
        }
        self.prune_stale(&entry.sender);
        self.reclassify(&entry.sender);
        self.forget_if_empty(&entry.sender);
        Ok(entry)
    }

    /// Removes every included transaction still in the pool.
    ///
    /// Returns the number of entries removed.
    pub fn on_block_mined(&mut self, included: &[Hash]) -> usize {
        let mut removed = 0;
        for hash in included {
            if self.remove(hash).is_ok() {
                removed += 1;
            }
        }
        removed
    }

    /// Removes a transaction that failed execution.
    ///
    /// The sender's nonce does not advance, so its higher nonces are demoted
    /// to queued until the gap is filled.
    pub fn drop_transaction(&mut self, hash: &Hash) -> Result<PoolEntry, MempoolError> {
        let entry = self.remove_internal(hash)?;
        self.reclassify(&entry.sender);
        self.forget_if_empty(&entry.sender);
        debug!(
            hash = %shared_types::format_hash(hash),
            nonce = entry.nonce,
            "Transaction dropped"
        );
        Ok(entry)
    }

    /// Records a new on-chain nonce for `sender`.
    ///
    /// Entries below it are stale and removed.
    pub fn update_account_nonce(&mut self, sender: &Address, nonce: u64) {
        let Some(queue) = self.by_sender.get_mut(sender) else {
            return;
        };
        queue.account_nonce = nonce;
        self.prune_stale(sender);
        self.reclassify(sender);
        self.forget_if_empty(sender);
    }

    /// Returns the pool status.
    pub fn status(&self) -> MempoolStatus {
        let mut status = MempoolStatus::default();
        for entry in self.by_hash.values() {
            match entry.class {
                TxClass::Pending => status.pending_count += 1,
                TxClass::Queued => status.queued_count += 1,
            }
            status.total_gas += entry.gas_limit;
        }
        status
    }

    /// Per-sender introspection of the classification state.
    pub fn snapshot(&self) -> PoolSnapshot {
        let mut senders: Vec<SenderRun> = self
            .by_sender
            .iter()
            .map(|(sender, queue)| {
                let mut run = SenderRun {
                    sender: *sender,
                    account_nonce: queue.account_nonce,
                    pending_nonces: Vec::new(),
                    queued_nonces: Vec::new(),
                };
                for (nonce, hash) in &queue.txs {
                    match self.by_hash.get(hash).map(|e| e.class) {
                        Some(TxClass::Pending) => run.pending_nonces.push(*nonce),
                        Some(TxClass::Queued) => run.queued_nonces.push(*nonce),
                        None => {}
                    }
                }
                run
            })
            .collect();
        senders.sort_by_key(|run| run.sender);

        let status = self.status();
        PoolSnapshot {
            pending: status.pending_count,
            queued: status.queued_count,
            senders,
        }
    }

    // =========================================================================
    // INTERNAL
    // =========================================================================

    fn remove_internal(&mut self, hash: &Hash) -> Result<PoolEntry, MempoolError> {
        let entry = self
            .by_hash
            .remove(hash)
            .ok_or(MempoolError::TransactionNotFound(*hash))?;

        if let Some(queue) = self.by_sender.get_mut(&entry.sender) {
            if queue.txs.get(&entry.nonce) == Some(hash) {
                queue.txs.remove(&entry.nonce);
            }
        }
        Ok(entry)
    }

    /// Removes entries whose nonce is below the sender's on-chain nonce.
    fn prune_stale(&mut self, sender: &Address) {
        let Some(queue) = self.by_sender.get_mut(sender) else {
            return;
        };
        let keep = queue.txs.split_off(&queue.account_nonce);
        let stale = std::mem::replace(&mut queue.txs, keep);
        for (nonce, hash) in stale {
            self.by_hash.remove(&hash);
            debug!(nonce, "Pruned stale transaction");
        }
    }

    /// Recomputes pending/queued for one sender. Returns the number promoted.
    fn reclassify(&mut self, sender: &Address) -> usize {
        let Some(queue) = self.by_sender.get(sender) else {
            return 0;
        };
        let classes = classify_nonces(queue.account_nonce, queue.txs.keys().copied());

        let mut promoted = 0;
        for (hash, class) in queue.txs.values().zip(classes) {
            if let Some(entry) = self.by_hash.get_mut(hash) {
                if entry.class == TxClass::Queued && class == TxClass::Pending {
                    promoted += 1;
                }
                entry.class = class;
            }
        }
        if promoted > 0 {
            debug!(
                sender = %shared_types::format_address(sender),
                promoted,
                "Promoted queued transactions"
            );
        }
        promoted
    }

    fn forget_if_empty(&mut self, sender: &Address) {
        if self.by_sender.get(sender).is_some_and(|q| q.txs.is_empty()) {
            self.by_sender.remove(sender);
        }
    }
}
