//! Invariant checkers for built blocks
//!
//! Run on every block before it is handed back to the caller.

use crate::error::{BlockBuildError, Result};
use shared_types::{Address, Block};
use std::collections::HashMap;

/// Gas used never exceeds the block gas limit.
pub fn check_gas_limit(block: &Block) -> Result<()> {
    if block.header.gas_used > block.header.gas_limit {
        return Err(BlockBuildError::GasLimitExceeded {
            used: block.header.gas_used,
            limit: block.header.gas_limit,
        });
    }
    Ok(())
}

/// Transactions of one sender appear with sequential nonces, in order.
pub fn check_nonce_ordering(block: &Block) -> Result<()> {
    let mut next_nonce: HashMap<Address, u64> = HashMap::new();

    for tx in &block.transactions {
        if let Some(expected) = next_nonce.get(&tx.from) {
            if tx.nonce != *expected {
                return Err(BlockBuildError::NonceMismatch {
                    address: tx.from,
                    expected: *expected,
                    actual: tx.nonce,
                });
            }
        }
        next_nonce.insert(tx.from, tx.nonce + 1);
    }

    Ok(())
}

/// Runs every check.
pub fn check_all(block: &Block) -> Result<()> {
    check_gas_limit(block)?;
    check_nonce_ordering(block)
}
