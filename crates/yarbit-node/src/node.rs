//! Full node composition.
//!
//! [`Node`] wires together [`State`], [`Mempool`], [`PeerDirectory`], the
//! mining supervisor, and the peer sync service, and owns the shutdown
//! token propagated to each of them.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::info;

use yarbit_core::error::NodeError;
use yarbit_core::events::{self, EventReceiver, EventSender};
use yarbit_core::hash::Hash;
use yarbit_core::mempool::Mempool;
use yarbit_core::state::State;
use yarbit_core::types::{Account, Tx};
use yarbit_miner::Foreman;
use yarbit_network::peer::PeerDirectory;
use yarbit_network::sync::{ChainTip, ChainTipSource, SyncService};

use crate::config::NodeConfig;

/// Bridges the live [`State`] lock to [`ChainTipSource`] so the peer sync
/// service can read the chain tip without depending on `yarbit-core`'s
/// `State` type directly.
struct StateTip(Arc<RwLock<State>>);

impl ChainTipSource for StateTip {
    fn chain_tip(&self) -> ChainTip {
        let state = self.0.read();
        ChainTip {
            number: state.tip_number(),
            hash: state.last_hash(),
        }
    }
}

/// The full node: ledger state, mempool, peer directory, miner, and sync
/// service, composed and ready to run.
pub struct Node {
    state: Arc<RwLock<State>>,
    mempool: Arc<Mutex<Mempool>>,
    peers: Arc<Mutex<PeerDirectory>>,
    config: NodeConfig,
    events: EventSender,
}

impl Node {
    /// Load state from `config.data_dir` (creating genesis if absent) and
    /// construct the node. Does not start any background task.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        let state = Arc::new(RwLock::new(State::load(&config.data_dir)?));
        let mempool = Arc::new(Mutex::new(Mempool::new()));
        let mut peers = PeerDirectory::new(config.self_socket());
        if let Some(bootstrap) = &config.bootstrap {
            peers.add_peer(bootstrap.clone());
        }
        let (events, _rx) = events::channel();

        Ok(Node {
            state,
            mempool,
            peers: Arc::new(Mutex::new(peers)),
            config,
            events,
        })
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    pub fn balances(&self) -> std::collections::HashMap<Account, u64> {
        self.state.read().balances().clone()
    }

    pub fn tip_hash(&self) -> Hash {
        self.state.read().last_hash()
    }

    /// Submit a transaction to the local mempool. Returns its content hash.
    pub fn add_tx(&self, from: Account, to: Account, value: u64, data: String) -> Hash {
        let mut tx = Tx::new(from, to, value);
        tx.data = data;
        self.mempool.lock().add_pending(tx)
    }

    /// Run the mining supervisor and peer sync service until `shutdown`
    /// fires. Consumes the node; callers keep their own `Arc` handles
    /// (state/mempool/peers) from before calling `run` if they need to
    /// query the node concurrently (e.g. the HTTP server).
    pub async fn run(self, shutdown: CancellationToken) {
        let foreman = Foreman::new(
            self.state.clone(),
            self.mempool.clone(),
            self.config.miner_account.clone(),
            Some(self.events.clone()),
        );
        let new_block_tx = foreman.new_block_sender();

        let sync = SyncService::new(
            self.peers.clone(),
            self.mempool.clone(),
            Arc::new(StateTip(self.state.clone())),
            self.config.self_peer(),
            new_block_tx,
            Some(self.events.clone()),
        );

        info!(socket = %self.config.self_socket(), "node starting");

        tokio::join!(
            foreman.run(shutdown.child_token()),
            sync.run(shutdown.child_token()),
        );
    }

    pub fn state(&self) -> Arc<RwLock<State>> {
        self.state.clone()
    }

    pub fn mempool(&self) -> Arc<Mutex<Mempool>> {
        self.mempool.clone()
    }

    pub fn peers(&self) -> Arc<Mutex<PeerDirectory>> {
        self.peers.clone()
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// A cheaply cloneable handle onto this node's shared state, for the
    /// HTTP server to hold independently of `run`, which consumes `self`.
    pub fn handle(&self) -> NodeHandle {
        NodeHandle {
            state: self.state.clone(),
            mempool: self.mempool.clone(),
            peers: self.peers.clone(),
            config: self.config.clone(),
        }
    }
}

/// Read/write access to a running node's state, mempool, and peer directory,
/// independent of the `Node` value itself — the HTTP server holds one of
/// these while `Node::run` separately owns and drives the miner and sync
/// loops, so neither side needs a back-pointer to the other.
#[derive(Clone)]
pub struct NodeHandle {
    state: Arc<RwLock<State>>,
    mempool: Arc<Mutex<Mempool>>,
    peers: Arc<Mutex<PeerDirectory>>,
    config: NodeConfig,
}

impl NodeHandle {
    pub fn state(&self) -> Arc<RwLock<State>> {
        self.state.clone()
    }

    pub fn mempool(&self) -> Arc<Mutex<Mempool>> {
        self.mempool.clone()
    }

    pub fn peers(&self) -> Arc<Mutex<PeerDirectory>> {
        self.peers.clone()
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn balances(&self) -> HashMap<Account, u64> {
        self.state.read().balances().clone()
    }

    pub fn tip_hash(&self) -> Hash {
        self.state.read().last_hash()
    }

    pub fn add_tx(&self, from: Account, to: Account, value: u64, data: String) -> Hash {
        let mut tx = Tx::new(from, to, value);
        tx.data = data;
        self.mempool.lock().add_pending(tx)
    }
}
