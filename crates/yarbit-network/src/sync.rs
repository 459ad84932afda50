//! Peer sync service.
//!
//! Every tick, for each known peer: fetch its status, learn about any
//! peers it knows that we don't, gossip its pending transactions into our
//! mempool, introduce ourselves back to it, and — if it is strictly ahead
//! of us — fetch and forward its new blocks onto the mining supervisor's
//! acceptance channel. A failure talking to one peer never stops the tick
//! from visiting the rest; only a failed status fetch evicts a peer.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use yarbit_core::constants::{PEER_TIMEOUT_SECS, TICK_INTERVAL_SECS};
use yarbit_core::events::{EventSender, NodeEvent};
use yarbit_core::hash::Hash;
use yarbit_core::mempool::Mempool;
use yarbit_core::types::Block;

use crate::dto::{PeerAddResponse, StatusResponse, SyncResponse};
use crate::peer::{PeerDirectory, PeerNode};

/// The information the sync service needs about our own chain each tick;
/// supplied by the caller so this crate never depends on `yarbit-core`'s
/// `State` lock directly.
#[derive(Debug, Clone, Copy)]
pub struct ChainTip {
    pub number: u64,
    pub hash: Hash,
}

pub trait ChainTipSource: Send + Sync + 'static {
    fn chain_tip(&self) -> ChainTip;
}

/// Whether block catch-up against a peer reporting `peer_number` should be
/// skipped given our own tip.
///
/// A peer reporting tip `0` is ambiguous: it may hold only the genesis
/// block (same as ours, if we already have one) or be genuinely empty. That
/// case is treated as nothing new whenever we already hold a block
/// ourselves, since a real catch-up would otherwise fetch after our own
/// hash and get nothing back anyway.
fn skip_catch_up(peer_number: u64, our: ChainTip) -> bool {
    let peer_at_our_tip = peer_number == 0 && !our.hash.is_zero();
    peer_number < our.number || peer_at_our_tip
}

pub struct SyncService<T: ChainTipSource> {
    client: reqwest::Client,
    peers: Arc<Mutex<PeerDirectory>>,
    mempool: Arc<Mutex<Mempool>>,
    chain: Arc<T>,
    self_peer: PeerNode,
    new_block_tx: mpsc::UnboundedSender<Block>,
    events: Option<EventSender>,
}

impl<T: ChainTipSource> SyncService<T> {
    pub fn new(
        peers: Arc<Mutex<PeerDirectory>>,
        mempool: Arc<Mutex<Mempool>>,
        chain: Arc<T>,
        self_peer: PeerNode,
        new_block_tx: mpsc::UnboundedSender<Block>,
        events: Option<EventSender>,
    ) -> Self {
        SyncService {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(PEER_TIMEOUT_SECS))
                .build()
                .expect("reqwest client config is static and always valid"),
            peers,
            mempool,
            chain,
            self_peer,
            new_block_tx,
            events,
        }
    }

    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = time::interval(Duration::from_secs(TICK_INTERVAL_SECS));
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("peer sync service shutting down");
                    return;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    async fn tick(&self) {
        let snapshot = self.peers.lock().snapshot();
        for (socket, _peer) in snapshot {
            self.sync_with(&socket).await;
        }
    }

    async fn sync_with(&self, socket: &str) {
        let status = match self.fetch_status(socket).await {
            Ok(status) => status,
            Err(e) => {
                warn!(%socket, error = %e, "peer unreachable, removing");
                self.peers.lock().remove_peer(socket);
                if let Some(events) = &self.events {
                    let _ = events.send(NodeEvent::PeerRemoved { socket: socket.to_string() });
                }
                return;
            }
        };

        self.discover_peers(&status);
        self.gossip_pending_txs(&status);
        self.introduce_self(socket).await;
        self.catch_up_blocks(socket, &status).await;
    }

    async fn fetch_status(&self, socket: &str) -> Result<StatusResponse, reqwest::Error> {
        self.client
            .get(format!("http://{socket}/node/status"))
            .send()
            .await?
            .json::<StatusResponse>()
            .await
    }

    fn discover_peers(&self, status: &StatusResponse) {
        for (socket, peer) in &status.known_peers {
            if socket == self.self_peer.socket().as_str() {
                continue;
            }
            if self.peers.lock().add_peer(peer.clone()) {
                debug!(%socket, "discovered new peer");
                if let Some(events) = &self.events {
                    let _ = events.send(NodeEvent::PeerAdded { socket: socket.clone() });
                }
            }
        }
    }

    fn gossip_pending_txs(&self, status: &StatusResponse) {
        let mut mempool = self.mempool.lock();
        for tx in &status.pending_txs {
            mempool.add_pending(tx.clone());
        }
    }

    async fn introduce_self(&self, socket: &str) {
        let result = self
            .client
            .post(format!("http://{socket}/node/peer"))
            .json(&self.self_peer)
            .send()
            .await;
        match result {
            Ok(resp) => match resp.json::<PeerAddResponse>().await {
                Ok(body) => debug!(%socket, success = body.success, "introduced self to peer"),
                Err(e) => warn!(%socket, error = %e, "malformed peer-introduction response"),
            },
            Err(e) => warn!(%socket, error = %e, "failed to introduce self to peer"),
        }
    }

    async fn catch_up_blocks(&self, socket: &str, status: &StatusResponse) {
        let our = self.chain.chain_tip();
        if skip_catch_up(status.block_number, our) {
            return;
        }
        let after = our.hash.to_hex();
        let result = self
            .client
            .get(format!("http://{socket}/node/sync?after={after}"))
            .send()
            .await;
        let sync = match result {
            Ok(resp) => resp.json::<SyncResponse>().await,
            Err(e) => {
                warn!(%socket, error = %e, "failed to fetch blocks");
                return;
            }
        };
        match sync {
            Ok(sync) => {
                info!(%socket, count = sync.blocks.len(), "catching up blocks");
                for block in sync.blocks {
                    if self.new_block_tx.send(block).is_err() {
                        return;
                    }
                }
            }
            Err(e) => warn!(%socket, error = %e, "malformed sync response"),
        }
    }
}
