//! Domain services for block building

use shared_types::{Address, U256};
use sim_04_mempool::PoolEntry;
use sim_02_hardfork::Hardfork;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, VecDeque};

/// EIP-1559 elasticity multiplier.
pub const ELASTICITY_MULTIPLIER: u64 = 2;

/// EIP-1559 base fee max change denominator.
pub const BASE_FEE_MAX_CHANGE_DENOMINATOR: u64 = 8;

/// Base fee of a block given its parent.
///
/// Gas above the target (half the limit) raises the base fee by up to 1/8,
/// gas below it lowers the base fee by up to 1/8.
pub fn calculate_next_base_fee(parent_gas_used: u64, parent_gas_limit: u64, parent_base_fee: U256) -> U256 {
    let target = parent_gas_limit / ELASTICITY_MULTIPLIER;
    if target == 0 {
        return parent_base_fee;
    }

    match parent_gas_used.cmp(&target) {
        Ordering::Equal => parent_base_fee,
        Ordering::Greater => {
            let delta = parent_base_fee * U256::from(parent_gas_used - target)
                / U256::from(target)
                / U256::from(BASE_FEE_MAX_CHANGE_DENOMINATOR);
            parent_base_fee + delta.max(U256::one())
        }
        Ordering::Less => {
            let delta = parent_base_fee * U256::from(target - parent_gas_used)
                / U256::from(target)
                / U256::from(BASE_FEE_MAX_CHANGE_DENOMINATOR);
            parent_base_fee.saturating_sub(delta)
        }
    }
}

/// Reward for sealing a block: subsidy plus priority fees.
pub fn calculate_block_reward(hardfork: Hardfork, priority_fees: U256) -> U256 {
    hardfork.block_reward().saturating_add(priority_fees)
}

/// A sender's current head in the selection heap.
#[derive(Debug, PartialEq, Eq)]
struct Candidate {
    price: U256,
    arrival: u64,
    sender: Address,
}

impl Ord for Candidate {
    // Highest price first, then earliest arrival.
    fn cmp(&self, other: &Self) -> Ordering {
        self.price
            .cmp(&other.price)
            .then_with(|| other.arrival.cmp(&self.arrival))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Price-ordered queue over each sender's pending run.
///
/// Only a sender's nonce head is ever a candidate. Accepting it exposes the
/// sender's next nonce; blocking it removes the sender for the rest of the
/// block.
#[derive(Debug)]
pub struct CandidateQueue {
    base_fee: Option<U256>,
    runs: BTreeMap<Address, VecDeque<PoolEntry>>,
    heap: BinaryHeap<Candidate>,
    unpayable: Vec<PoolEntry>,
}

impl CandidateQueue {
    /// Builds the queue from the pool's pending runs.
    pub fn new(pending: BTreeMap<Address, Vec<PoolEntry>>, base_fee: Option<U256>) -> Self {
        let mut queue = Self {
            base_fee,
            runs: pending
                .into_iter()
                .map(|(sender, run)| (sender, VecDeque::from(run)))
                .collect(),
            heap: BinaryHeap::new(),
            unpayable: Vec::new(),
        };
        let senders: Vec<Address> = queue.runs.keys().copied().collect();
        for sender in senders {
            queue.push_head(sender);
        }
        queue
    }

    /// Highest priority head, removed from its sender's run.
    pub fn pop(&mut self) -> Option<PoolEntry> {
        while let Some(candidate) = self.heap.pop() {
            if let Some(head) = self
                .runs
                .get_mut(&candidate.sender)
                .and_then(VecDeque::pop_front)
            {
                return Some(head);
            }
        }
        None
    }

    /// Makes the sender's next nonce a candidate.
    pub fn accept(&mut self, sender: Address) {
        self.push_head(sender);
    }

    /// Excludes the sender from the rest of this block.
    pub fn block(&mut self, sender: Address) {
        self.runs.remove(&sender);
    }

    /// Heads that could not pay the base fee, collected so far.
    pub fn take_unpayable(&mut self) -> Vec<PoolEntry> {
        std::mem::take(&mut self.unpayable)
    }

    /// True when no candidates remain.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    fn push_head(&mut self, sender: Address) {
        let Some(run) = self.runs.get_mut(&sender) else {
            return;
        };
        let Some(head) = run.front() else {
            self.runs.remove(&sender);
            return;
        };
        match head.effective_gas_price(self.base_fee) {
            Some(price) => self.heap.push(Candidate {
                price,
                arrival: head.arrival,
                sender,
            }),
            None => {
                // Cannot pay the base fee; its successors are blocked too.
                if let Some(mut run) = self.runs.remove(&sender) {
                    if let Some(head) = run.pop_front() {
                        self.unpayable.push(head);
                    }
                }
            }
        }
    }
}
