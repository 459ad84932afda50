//! Wire DTOs shared by the peer sync client and the node's HTTP server.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use yarbit_core::hash::Hash;
use yarbit_core::types::{Account, Block, Tx};

use crate::peer::PeerNode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub block_hash: Hash,
    pub block_number: u64,
    pub known_peers: HashMap<String, PeerNode>,
    pub pending_txs: Vec<Tx>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResponse {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerAddResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxAddRequest {
    pub from: Account,
    pub to: Account,
    pub value: u64,
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxAddResponse {
    pub tx_hash: Hash,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalancesListResponse {
    pub block_hash: Hash,
    pub balances: HashMap<Account, u64>,
}
