//! Domain services for the Mempool subsystem.
//!
//! Stateless rules shared by the pool and its tests.

use super::entities::{PoolEntry, SignedTransaction, TxClass, U256};

/// Minimum price for a same-nonce replacement.
///
/// Formula: old_price * (100 + bump_percent) / 100
pub fn calculate_replacement_min_price(old_price: U256, bump_percent: u64) -> U256 {
    old_price.saturating_mul(U256::from(100 + bump_percent)) / U256::from(100)
}

/// Checks that `new` outbids `old` by the bump on both max fee and priority fee.
pub fn is_valid_replacement(
    old: &SignedTransaction,
    new: &SignedTransaction,
    bump_percent: u64,
) -> bool {
    new.max_fee_per_gas() >= calculate_replacement_min_price(old.max_fee_per_gas(), bump_percent)
        && new.max_priority_fee_per_gas()
            >= calculate_replacement_min_price(old.max_priority_fee_per_gas(), bump_percent)
}

/// Classifies a sender's nonces against its on-chain nonce.
///
/// Nonces must be ascending. The gap-free run starting at `account_nonce`
/// is pending; everything after the first gap is queued.
pub fn classify_nonces(account_nonce: u64, nonces: impl IntoIterator<Item = u64>) -> Vec<TxClass> {
    let mut expected = account_nonce;
    let mut gap = false;
    nonces
        .into_iter()
        .map(|nonce| {
            if !gap && nonce == expected {
                expected += 1;
                TxClass::Pending
            } else {
                gap = true;
                TxClass::Queued
            }
        })
        .collect()
}

/// Checks the classification invariant for one sender's entries.
///
/// Pending nonces form a contiguous ascending run starting at
/// `account_nonce`, and no queued entry precedes a pending one.
pub fn validate_sender_entries(entries: &[&PoolEntry], account_nonce: u64) -> bool {
    let mut sorted: Vec<_> = entries.to_vec();
    sorted.sort_by_key(|e| e.nonce);

    let mut expected = account_nonce;
    let mut seen_queued = false;
    for entry in sorted {
        match entry.class {
            TxClass::Pending => {
                if seen_queued || entry.nonce != expected {
                    return false;
                }
                expected += 1;
            }
            TxClass::Queued => {
                if entry.nonce == expected && !seen_queued {
                    // Should have been promoted.
                    return false;
                }
                seen_queued = true;
            }
        }
    }
    true
}
