//! Pending and completed transaction sets.
//!
//! Admission is idempotent by transaction hash: submitting the same
//! transaction twice, whether via the HTTP API or peer gossip, yields a
//! single pending entry. `completed` only ever grows from `pending` moving
//! across on block acceptance, and is capped with FIFO eviction so a
//! long-running node does not accumulate an unbounded history — eviction
//! never changes acceptance behavior since completed transactions are
//! never re-validated.

use std::collections::{HashMap, VecDeque};

use crate::constants::MAX_COMPLETED_TXS;
use crate::hash::Hash;
use crate::types::Tx;

/// In-memory store of not-yet-mined (`pending`) and mined (`completed`)
/// transactions, keyed by content hash.
pub struct Mempool {
    pending: HashMap<Hash, Tx>,
    completed: HashMap<Hash, Tx>,
    completed_order: VecDeque<Hash>,
    max_completed: usize,
}

impl Mempool {
    pub fn new() -> Self {
        Mempool {
            pending: HashMap::new(),
            completed: HashMap::new(),
            completed_order: VecDeque::new(),
            max_completed: MAX_COMPLETED_TXS,
        }
    }

    #[cfg(test)]
    fn with_completed_cap(max_completed: usize) -> Self {
        Mempool {
            max_completed,
            ..Self::new()
        }
    }

    /// Admit `tx` into the pending set. No-op if already completed or
    /// already pending; both cases return the transaction's hash.
    pub fn add_pending(&mut self, tx: Tx) -> Hash {
        let hash = tx.hash();
        if self.completed.contains_key(&hash) {
            return hash;
        }
        self.pending.entry(hash).or_insert(tx);
        hash
    }

    /// Move `txs` from pending to completed. Called after a block
    /// containing them is accepted.
    pub fn complete(&mut self, txs: &[Tx]) {
        for tx in txs {
            let hash = tx.hash();
            if let Some(tx) = self.pending.remove(&hash) {
                self.insert_completed(hash, tx);
            } else if !self.completed.contains_key(&hash) {
                // Block came from a peer and never passed through our own
                // pending set (e.g. a reward tx we didn't mine ourselves).
                self.insert_completed(hash, tx.clone());
            }
        }
    }

    fn insert_completed(&mut self, hash: Hash, tx: Tx) {
        self.completed.insert(hash, tx);
        self.completed_order.push_back(hash);
        while self.completed_order.len() > self.max_completed {
            if let Some(oldest) = self.completed_order.pop_front() {
                self.completed.remove(&oldest);
            }
        }
    }

    /// Drop `txs` from pending without marking them completed.
    pub fn remove(&mut self, txs: &[Tx]) {
        for tx in txs {
            self.pending.remove(&tx.hash());
        }
    }

    /// Snapshot of all pending transactions, in unspecified order.
    pub fn pending_snapshot(&self) -> Vec<Tx> {
        self.pending.values().cloned().collect()
    }

    pub fn is_pending(&self, hash: &Hash) -> bool {
        self.pending.contains_key(hash)
    }

    pub fn is_completed(&self, hash: &Hash) -> bool {
        self.completed.contains_key(hash)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn completed_len(&self) -> usize {
        self.completed.len()
    }
}

impl Default for Mempool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_pending_is_idempotent() {
        let mut pool = Mempool::new();
        let tx = Tx::new("andrej", "babayaga", 10);
        let h1 = pool.add_pending(tx.clone());
        let h2 = pool.add_pending(tx);
        assert_eq!(h1, h2);
        assert_eq!(pool.pending_len(), 1);
    }

    #[test]
    fn complete_moves_tx_out_of_pending() {
        let mut pool = Mempool::new();
        let tx = Tx::new("andrej", "babayaga", 10);
        pool.add_pending(tx.clone());

        pool.complete(&[tx.clone()]);

        assert!(!pool.is_pending(&tx.hash()));
        assert!(pool.is_completed(&tx.hash()));
    }

    // Invariant 4: pending and completed are always disjoint.
    #[test]
    fn pending_and_completed_are_disjoint() {
        let mut pool = Mempool::new();
        let tx = Tx::new("andrej", "babayaga", 10);
        pool.add_pending(tx.clone());
        pool.complete(&[tx.clone()]);
        assert!(!(pool.is_pending(&tx.hash()) && pool.is_completed(&tx.hash())));
    }

    #[test]
    fn add_pending_after_completed_is_noop() {
        let mut pool = Mempool::new();
        let tx = Tx::new("andrej", "babayaga", 10);
        pool.add_pending(tx.clone());
        pool.complete(&[tx.clone()]);

        pool.add_pending(tx.clone());
        assert!(!pool.is_pending(&tx.hash()));
        assert_eq!(pool.pending_len(), 0);
    }

    #[test]
    fn remove_drops_from_pending_without_completing() {
        let mut pool = Mempool::new();
        let tx = Tx::new("andrej", "babayaga", 10);
        pool.add_pending(tx.clone());
        pool.remove(&[tx.clone()]);

        assert!(!pool.is_pending(&tx.hash()));
        assert!(!pool.is_completed(&tx.hash()));
    }

    #[test]
    fn pending_snapshot_contains_all() {
        let mut pool = Mempool::new();
        pool.add_pending(Tx::new("a", "b", 1));
        pool.add_pending(Tx::new("c", "d", 2));
        assert_eq!(pool.pending_snapshot().len(), 2);
    }

    #[test]
    fn completed_set_evicts_oldest_first() {
        let mut pool = Mempool::with_completed_cap(2);
        let t1 = Tx::new("a", "b", 1);
        let t2 = Tx::new("a", "b", 2);
        let t3 = Tx::new("a", "b", 3);

        pool.complete(&[t1.clone()]);
        pool.complete(&[t2.clone()]);
        pool.complete(&[t3.clone()]);

        assert_eq!(pool.completed_len(), 2);
        assert!(!pool.is_completed(&t1.hash()));
        assert!(pool.is_completed(&t2.hash()));
        assert!(pool.is_completed(&t3.hash()));
    }

    #[test]
    fn complete_of_tx_not_in_pending_still_completes() {
        // Mirrors a block fetched from a peer: its txs never passed
        // through our own pending set.
        let mut pool = Mempool::new();
        let tx = Tx::reward("andrej", 10);
        pool.complete(&[tx.clone()]);
        assert!(pool.is_completed(&tx.hash()));
    }

    #[test]
    fn default_constructs_empty_pool() {
        let pool = Mempool::default();
        assert_eq!(pool.pending_len(), 0);
        assert_eq!(pool.completed_len(), 0);
    }
}
