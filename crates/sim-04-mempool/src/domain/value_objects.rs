//! Value objects returned by the pool.

use serde::{Deserialize, Serialize};

use super::entities::{Address, Hash, TxClass};

/// Result of a successful admission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Admission {
    /// Hash of the admitted transaction.
    pub hash: Hash,
    /// Classification right after admission.
    pub class: TxClass,
    /// Pooled transaction this one replaced, if any.
    pub replaced: Option<Hash>,
    /// Number of queued entries promoted to pending by this admission.
    pub promoted: usize,
}

/// Mempool status summary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MempoolStatus {
    /// Number of executable transactions.
    pub pending_count: usize,
    /// Number of nonce-gapped transactions.
    pub queued_count: usize,
    /// Sum of declared gas limits across the pool.
    pub total_gas: u64,
}

impl MempoolStatus {
    /// Total number of pooled transactions.
    pub fn total(&self) -> usize {
        self.pending_count + self.queued_count
    }
}

/// One sender's nonce layout in the pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderRun {
    /// Sender address.
    pub sender: Address,
    /// On-chain nonce last reported for the sender.
    pub account_nonce: u64,
    /// Ascending pending nonces.
    pub pending_nonces: Vec<u64>,
    /// Ascending queued nonces.
    pub queued_nonces: Vec<u64>,
}

impl SenderRun {
    /// True if the pending nonces are gap-free from the account nonce.
    pub fn is_contiguous(&self) -> bool {
        self.pending_nonces
            .iter()
            .enumerate()
            .all(|(i, nonce)| *nonce == self.account_nonce + i as u64)
    }
}

/// Point-in-time introspection of the pool.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSnapshot {
    /// Number of executable transactions.
    pub pending: usize,
    /// Number of nonce-gapped transactions.
    pub queued: usize,
    /// Per-sender layout, ordered by address.
    pub senders: Vec<SenderRun>,
}

impl PoolSnapshot {
    /// Looks up one sender's layout.
    pub fn sender(&self, address: &Address) -> Option<&SenderRun> {
        self.senders.iter().find(|run| &run.sender == address)
    }
}
