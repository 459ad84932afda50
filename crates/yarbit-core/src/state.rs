//! The authoritative balance table and chain tip.
//!
//! `State` is the single serialization point for block acceptance: every
//! mutation goes through [`State::add_block`], which validates a candidate
//! against a cloned balances table and only swaps the clone into place once
//! the block has proof-of-work, seriality, and persistence all confirmed.
//! A rejected block leaves `State` byte-identical to before the call.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::block_store::FileBlockStore;
use crate::constants::{BLOCK_REWARD, DATABASE_DIR, DIFFICULTY, GENESIS_FILENAME, BLOCK_DB_FILENAME};
use crate::error::{StateError, TxError};
use crate::genesis::Genesis;
use crate::hash::Hash;
use crate::types::{Account, Block, Tx};

/// In-memory balances plus chain tip, derived by folding the genesis
/// allocation with every block in the log.
pub struct State {
    balances: HashMap<Account, u64>,
    last_hash: Hash,
    last_block: Option<Block>,
    has_genesis: bool,
    store: Arc<FileBlockStore>,
}

impl State {
    /// Ensure the data directory and genesis file exist, then replay the
    /// entire block log to derive the current balances and tip.
    pub fn load(data_dir: &Path) -> Result<Self, StateError> {
        let genesis_path = data_dir.join(DATABASE_DIR).join(GENESIS_FILENAME);
        let genesis = Genesis::load_or_init(&genesis_path)
            .map_err(|e| StateError::Load(e.to_string()))?;

        let store = Arc::new(FileBlockStore::new(
            data_dir.join(DATABASE_DIR).join(BLOCK_DB_FILENAME),
        ));
        let blocks = store
            .read_all()
            .map_err(|e| StateError::Load(e.to_string()))?;

        let mut state = State {
            balances: genesis.balances.into_iter().collect(),
            last_hash: Hash::ZERO,
            last_block: None,
            has_genesis: false,
            store,
        };

        for block in blocks {
            state.replay(block)?;
        }
        info!(blocks = state.last_block.as_ref().map(|b| b.header.number + 1).unwrap_or(0), "state loaded");
        Ok(state)
    }

    /// Construct a `State` directly over an already-open store, without
    /// touching disk. Used by tests that want a fresh in-memory chain.
    pub fn in_memory(genesis: Genesis, store: Arc<FileBlockStore>) -> Self {
        State {
            balances: genesis.balances.into_iter().collect(),
            last_hash: Hash::ZERO,
            last_block: None,
            has_genesis: false,
            store,
        }
    }

    pub fn next_block_number(&self) -> u64 {
        match &self.last_block {
            None => 0,
            Some(b) => b.header.number + 1,
        }
    }

    /// The current chain tip's block number, or `0` before genesis — used
    /// for the wire status/sync comparison, distinct from
    /// [`Self::next_block_number`] which is one past the tip.
    pub fn tip_number(&self) -> u64 {
        self.last_block.as_ref().map(|b| b.header.number).unwrap_or(0)
    }

    pub fn last_hash(&self) -> Hash {
        self.last_hash
    }

    pub fn last_block(&self) -> Option<&Block> {
        self.last_block.as_ref()
    }

    pub fn has_genesis(&self) -> bool {
        self.has_genesis
    }

    pub fn balance(&self, account: &str) -> u64 {
        *self.balances.get(account).unwrap_or(&0)
    }

    pub fn balances(&self) -> &HashMap<Account, u64> {
        &self.balances
    }

    pub fn store(&self) -> Arc<FileBlockStore> {
        self.store.clone()
    }

    /// Validate and, on success, durably append `block`.
    ///
    /// On any validation failure this `State` is left completely unchanged:
    /// the balances clone is discarded before the error is returned.
    pub fn add_block(&mut self, block: Block) -> Result<Hash, StateError> {
        let mut candidate = self.balances.clone();
        Self::validate_and_apply(&mut candidate, self.next_block_number(), self.last_hash, &block)?;

        let hash = block.hash();
        self.store.write(&[block.clone()])?;

        self.balances = candidate;
        self.last_hash = hash;
        self.has_genesis = true;
        info!(number = block.header.number, %hash, miner = %block.header.miner, "block accepted");
        self.last_block = Some(block);
        Ok(hash)
    }

    /// Apply a block already known to be durable (used by `load`). Failure
    /// here indicates a corrupted or hand-tampered block log.
    fn replay(&mut self, block: Block) -> Result<(), StateError> {
        Self::validate_and_apply(&mut self.balances, self.next_block_number(), self.last_hash, &block)?;
        self.last_hash = block.hash();
        self.has_genesis = true;
        self.last_block = Some(block);
        Ok(())
    }

    /// Validate `block` against `expected_number`/`expected_parent` and, on
    /// success, mutate `balances` in place. `balances` is untouched if any
    /// step fails.
    fn validate_and_apply(
        balances: &mut HashMap<Account, u64>,
        expected_number: u64,
        expected_parent: Hash,
        block: &Block,
    ) -> Result<(), StateError> {
        if block.header.number != expected_number {
            return Err(StateError::BadSequence {
                expected: expected_number,
                got: block.header.number,
            });
        }
        if block.header.parent != expected_parent {
            return Err(StateError::BadParent {
                expected: expected_parent.to_hex(),
                got: block.header.parent.to_hex(),
            });
        }
        if !block.meets_pow(DIFFICULTY) {
            return Err(StateError::InvalidPoW(block.hash().to_hex()));
        }

        let mut working = balances.clone();
        for (index, tx) in block.txs.iter().enumerate() {
            apply_tx(&mut working, tx).map_err(|source| StateError::InvalidTx { index, source })?;
        }
        *working.entry(block.header.miner.clone()).or_insert(0) += BLOCK_REWARD;

        *balances = working;
        Ok(())
    }
}

/// Apply one transaction's effect to `balances`. A reward transaction
/// credits `tx.to` with no debit; a transfer requires `balances[tx.from] >=
/// tx.value`.
fn apply_tx(balances: &mut HashMap<Account, u64>, tx: &Tx) -> Result<(), TxError> {
    if tx.is_reward() {
        *balances.entry(tx.to.clone()).or_insert(0) += tx.value;
        return Ok(());
    }
    let have = *balances.get(&tx.from).unwrap_or(&0);
    if have < tx.value {
        warn!(account = %tx.from, have, need = tx.value, "rejected transfer: insufficient balance");
        return Err(TxError::InsufficientBalance {
            account: tx.from.clone(),
            have,
            need: tx.value,
        });
    }
    *balances.get_mut(&tx.from).unwrap() -= tx.value;
    *balances.entry(tx.to.clone()).or_insert(0) += tx.value;
    Ok(())
}

/// Mine nonces for `block` until its hash satisfies `difficulty`. Used only
/// by tests in this crate; production mining lives in the `yarbit-miner`
/// crate, which performs the identical search with cancellation support.
#[cfg(test)]
fn mine_for_test(block: &mut Block, difficulty: usize) {
    loop {
        if block.meets_pow(difficulty) {
            return;
        }
        block.header.nonce = block.header.nonce.wrapping_add(1);
        if block.header.nonce == 0 {
            block.header.time += 1;
        }
    }
}
