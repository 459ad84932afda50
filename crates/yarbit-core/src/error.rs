//! Error types for the ledger core.

use thiserror::Error;

/// Errors raised while validating and applying a candidate block against
/// the current [`crate::state::State`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("bad sequence: expected block number {expected}, got {got}")]
    BadSequence { expected: u64, got: u64 },
    #[error("bad parent: expected {expected}, got {got}")]
    BadParent { expected: String, got: String },
    #[error("invalid proof of work: hash {0} does not meet difficulty")]
    InvalidPoW(String),
    #[error("invalid transaction {index}: {source}")]
    InvalidTx { index: usize, source: TxError },
    #[error("persist failed: {0}")]
    Persist(#[from] BlockStoreError),
    #[error("load failed: {0}")]
    Load(String),
}

/// Errors raised while applying a single transaction to a balances table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TxError {
    #[error("insufficient balance: {account} has {have}, needs {need}")]
    InsufficientBalance {
        account: String,
        have: u64,
        need: u64,
    },
}

/// Errors raised by the append-only block log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockStoreError {
    #[error("io error: {0}")]
    Io(String),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<std::io::Error> for BlockStoreError {
    fn from(e: std::io::Error) -> Self {
        BlockStoreError::Io(e.to_string())
    }
}

/// Errors raised while decoding a hex-encoded hash.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HashDecodeError {
    #[error("hash must be 64 hex characters, got {0}")]
    WrongLength(usize),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

/// Top-level error aggregating every fallible operation in the ledger core.
///
/// Components return their own concrete enum internally; `NodeError` exists
/// only at process boundaries (the CLI entrypoint, HTTP handlers) so callers
/// never have to match on it directly.
#[derive(Error, Debug)]
pub enum NodeError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    BlockStore(#[from] BlockStoreError),
    #[error(transparent)]
    HashDecode(#[from] HashDecodeError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
