//! # In-Memory Execution Engine
//!
//! Reference `ExecutionEngine` executing plain value transfers.
//!
//! ## Pending Block Journal
//!
//! Writes made while a block is being built go to a per-block overlay. The
//! overlay is merged into committed state by `commit_block` (recording a
//! per-block history used for balance queries at past blocks) or thrown
//! away by `discard_block`.
//!
//! ## Forked State
//!
//! When forked, an account not yet known locally is loaded on first use from
//! the fork data source at the pinned block. The state lock is never held
//! across the remote fetch; a concurrent load of the same account keeps the
//! first value inserted.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use sha3::{Digest, Keccak256};
use shared_types::{
    format_address, AccountInfo, Address, BlockContext, CallOutcome, CallParams, Hash,
    SignedTransaction, U256,
};
use sim_02_hardfork::Hardfork;
use sim_03_fork_source::ForkDataSource;
use sim_05_block_builder::{EngineError, ExecutionEngine, ExecutionResult};
use tracing::{debug, warn};

/// Writes of the block being built.
struct PendingBlock {
    number: u64,
    writes: HashMap<Address, AccountInfo>,
}

#[derive(Default)]
struct EngineState {
    /// Committed (latest) accounts.
    accounts: HashMap<Address, AccountInfo>,
    /// Account values at the end of each block that changed them.
    history: HashMap<Address, BTreeMap<u64, AccountInfo>>,
    pending: Option<PendingBlock>,
}

impl EngineState {
    fn committed(&self, address: &Address) -> AccountInfo {
        self.accounts.get(address).cloned().unwrap_or_default()
    }

    fn current(&self, address: &Address) -> AccountInfo {
        self.pending
            .as_ref()
            .and_then(|p| p.writes.get(address).cloned())
            .unwrap_or_else(|| self.committed(address))
    }

    fn is_known(&self, address: &Address) -> bool {
        self.accounts.contains_key(address)
            || self
                .pending
                .as_ref()
                .is_some_and(|p| p.writes.contains_key(address))
    }

    fn pending_mut(&mut self) -> Result<&mut PendingBlock, EngineError> {
        self.pending
            .as_mut()
            .ok_or_else(|| EngineError::Fatal("no pending block is open".to_string()))
    }

    fn state_root(&self) -> Hash {
        let mut merged: BTreeMap<Address, AccountInfo> =
            self.accounts.iter().map(|(a, i)| (*a, i.clone())).collect();
        if let Some(pending) = &self.pending {
            merged.extend(pending.writes.iter().map(|(a, i)| (*a, i.clone())));
        }

        let mut hasher = Keccak256::new();
        for (address, info) in merged {
            let mut balance = [0u8; 32];
            info.balance.to_big_endian(&mut balance);
            hasher.update(address);
            hasher.update(info.nonce.to_be_bytes());
            hasher.update(balance);
        }
        hasher.finalize().into()
    }
}

/// Value-transfer executor with a per-block journal.
pub struct InMemoryExecutionEngine {
    state: Mutex<EngineState>,
    fork: Option<Arc<ForkDataSource>>,
}

impl Default for InMemoryExecutionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryExecutionEngine {
    /// Creates an engine with no accounts.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(EngineState::default()),
            fork: None,
        }
    }

    /// Creates an engine that loads unknown accounts from a forked chain.
    pub fn forked(fork: Arc<ForkDataSource>) -> Self {
        Self {
            state: Mutex::new(EngineState::default()),
            fork: Some(fork),
        }
    }

    /// Credits a genesis balance, recorded as the account's value at block 0.
    pub fn fund(&self, address: Address, balance: U256) {
        let mut state = self.state.lock();
        let info = AccountInfo {
            balance,
            ..state.committed(&address)
        };
        state
            .history
            .entry(address)
            .or_default()
            .insert(0, info.clone());
        state.accounts.insert(address, info);
    }

    /// Root over the committed accounts plus any pending writes.
    pub fn state_root(&self) -> Hash {
        self.state.lock().state_root()
    }

    /// True while a block is open.
    pub fn has_pending_block(&self) -> bool {
        self.state.lock().pending.is_some()
    }

    async fn ensure_loaded(&self, addresses: &[Address]) -> Result<(), EngineError> {
        let Some(fork) = &self.fork else {
            return Ok(());
        };
        for address in addresses {
            if self.state.lock().is_known(address) {
                continue;
            }
            let info = fork
                .get_account_state(*address, fork.fork_block_number())
                .await?;
            debug!(address = %format_address(address), "Account loaded from fork");
            self.state.lock().accounts.entry(*address).or_insert(info);
        }
        Ok(())
    }

    async fn account_at(&self, address: Address, block_number: u64) -> Result<AccountInfo, EngineError> {
        if let Some(info) = self
            .state
            .lock()
            .history
            .get(&address)
            .and_then(|h| h.range(..=block_number).next_back())
            .map(|(_, info)| info.clone())
        {
            return Ok(info);
        }

        match &self.fork {
            Some(fork) => fork
                .get_account_state(address, block_number.min(fork.fork_block_number()))
                .await
                .map_err(EngineError::from),
            None => Ok(AccountInfo::default()),
        }
    }
}

#[async_trait]
impl ExecutionEngine for InMemoryExecutionEngine {
    async fn get_account(&self, address: Address) -> Result<AccountInfo, EngineError> {
        self.ensure_loaded(&[address]).await?;
        Ok(self.state.lock().committed(&address))
    }

    async fn get_account_at(
        &self,
        address: Address,
        block_number: u64,
    ) -> Result<AccountInfo, EngineError> {
        self.account_at(address, block_number).await
    }

    async fn begin_block(&self, context: &BlockContext) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        if let Some(open) = &state.pending {
            return Err(EngineError::Fatal(format!(
                "block {} is still pending",
                open.number
            )));
        }
        state.pending = Some(PendingBlock {
            number: context.number,
            writes: HashMap::new(),
        });
        Ok(())
    }

    async fn execute_transaction(
        &self,
        tx: &SignedTransaction,
        context: &BlockContext,
        hardfork: Hardfork,
    ) -> Result<ExecutionResult, EngineError> {
        let mut touched = vec![tx.from];
        touched.extend(tx.to);
        self.ensure_loaded(&touched).await?;

        if tx.is_fee_market() && !hardfork.supports_fee_market() {
            return Err(EngineError::transaction(format!(
                "fee-market transaction under {hardfork}"
            )));
        }

        let intrinsic = tx.intrinsic_gas();
        if tx.gas_limit < intrinsic {
            return Err(EngineError::transaction(format!(
                "intrinsic gas too low: have {}, want {intrinsic}",
                tx.gas_limit
            )));
        }

        let price = tx
            .effective_gas_price(context.base_fee_per_gas)
            .ok_or_else(|| EngineError::transaction("max fee per gas less than block base fee"))?;

        let mut state = self.state.lock();
        let mut sender = state.current(&tx.from);
        if tx.nonce != sender.nonce {
            return Err(EngineError::transaction(format!(
                "nonce mismatch: expected {}, got {}",
                sender.nonce, tx.nonce
            )));
        }
        let max_cost = tx.max_cost();
        if sender.balance < max_cost {
            return Err(EngineError::transaction(format!(
                "insufficient funds for gas * price + value: have {} want {max_cost}",
                sender.balance
            )));
        }

        let gas_used = intrinsic;
        let fee = price.saturating_mul(U256::from(gas_used));
        // Contract creation needs an interpreter: reverts, gas is still charged.
        let success = tx.to.is_some();
        let transferred = if success { tx.value } else { U256::zero() };

        sender.nonce += 1;
        sender.balance = sender.balance.saturating_sub(fee).saturating_sub(transferred);
        let pending = state.pending_mut()?;
        pending.writes.insert(tx.from, sender);

        if let Some(to) = tx.to {
            let mut recipient = state.current(&to);
            recipient.balance = recipient.balance.saturating_add(transferred);
            state.pending_mut()?.writes.insert(to, recipient);
        } else {
            warn!(from = %format_address(&tx.from), "Contract creation is not supported, reverting");
        }

        Ok(ExecutionResult { gas_used, success })
    }

    async fn finalize_block(&self, coinbase: Address, reward: U256) -> Result<Hash, EngineError> {
        self.ensure_loaded(&[coinbase]).await?;
        let mut state = self.state.lock();
        let mut beneficiary = state.current(&coinbase);
        beneficiary.balance = beneficiary.balance.saturating_add(reward);
        state.pending_mut()?.writes.insert(coinbase, beneficiary);
        Ok(state.state_root())
    }

    async fn commit_block(&self) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        let pending = state
            .pending
            .take()
            .ok_or_else(|| EngineError::Fatal("no pending block to commit".to_string()))?;
        for (address, info) in pending.writes {
            state
                .history
                .entry(address)
                .or_default()
                .insert(pending.number, info.clone());
            state.accounts.insert(address, info);
        }
        debug!(number = pending.number, "Pending block committed");
        Ok(())
    }

    async fn discard_block(&self) {
        if let Some(pending) = self.state.lock().pending.take() {
            debug!(
                number = pending.number,
                writes = pending.writes.len(),
                "Pending block discarded"
            );
        }
    }

    async fn run_call(
        &self,
        params: &CallParams,
        context: &BlockContext,
        hardfork: Hardfork,
    ) -> Result<CallOutcome, EngineError> {
        if params.uses_fee_market() && !hardfork.supports_fee_market() {
            return Err(EngineError::transaction(format!(
                "fee-market call under {hardfork}"
            )));
        }

        let gas_limit = params.gas_limit.unwrap_or(context.gas_limit);
        let intrinsic = shared_types::INTRINSIC_GAS + shared_types::calldata_gas(&params.data);
        if gas_limit < intrinsic {
            return Ok(CallOutcome {
                success: false,
                gas_used: gas_limit,
                return_data: Vec::new(),
            });
        }

        let from = params.from.unwrap_or_default();
        let caller = self.account_at(from, context.number).await?;
        let success = params.to.is_some() && caller.balance >= params.value;

        Ok(CallOutcome {
            success,
            gas_used: intrinsic,
            return_data: Vec::new(),
        })
    }
}
