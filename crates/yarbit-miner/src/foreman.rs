//! The mining supervisor ("foreman"): the sole writer to [`State`].
//!
//! Both locally mined blocks and blocks fetched by peer sync funnel through
//! the same `new_block` channel, so acceptance is totally ordered and
//! "longest chain wins" collapses to "first valid extension accepted". The
//! foreman never holds the state lock and the mempool lock at the same
//! time — it takes one, does its work, releases it, then takes the other.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::time::{self, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use yarbit_core::constants::{DIFFICULTY, TICK_INTERVAL_SECS};
use yarbit_core::events::{EventSender, NodeEvent};
use yarbit_core::mempool::Mempool;
use yarbit_core::state::State;
use yarbit_core::types::{Account, Block};

use crate::pow;

/// Drives the local miner's lifecycle and is the single consumer of newly
/// produced blocks, whether mined locally or fetched from a peer.
pub struct Foreman {
    state: Arc<RwLock<State>>,
    mempool: Arc<Mutex<Mempool>>,
    miner_account: Account,
    events: Option<EventSender>,
    new_block_tx: mpsc::UnboundedSender<Block>,
    new_block_rx: mpsc::UnboundedReceiver<Block>,
}

impl Foreman {
    pub fn new(
        state: Arc<RwLock<State>>,
        mempool: Arc<Mutex<Mempool>>,
        miner_account: Account,
        events: Option<EventSender>,
    ) -> Self {
        let (new_block_tx, new_block_rx) = mpsc::unbounded_channel();
        Foreman {
            state,
            mempool,
            miner_account,
            events,
            new_block_tx,
            new_block_rx,
        }
    }

    /// A sender any task (chiefly peer sync) can push externally discovered
    /// blocks onto. They are serialized through the same acceptance path as
    /// locally mined blocks.
    pub fn new_block_sender(&self) -> mpsc::UnboundedSender<Block> {
        self.new_block_tx.clone()
    }

    /// Run the supervisor loop until `shutdown` fires.
    pub async fn run(mut self, shutdown: CancellationToken) {
        let mut ticker = time::interval(Duration::from_secs(TICK_INTERVAL_SECS));
        let mut mining = false;
        let mut miner_cancel: Option<CancellationToken> = None;
        let out = self.new_block_tx.clone();

        self.launch(&mut mining, &mut miner_cancel, &out, &shutdown);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    if let Some(c) = miner_cancel.take() {
                        c.cancel();
                    }
                    info!("mining supervisor shutting down");
                    return;
                }
                _ = ticker.tick() => {
                    if !mining {
                        self.launch(&mut mining, &mut miner_cancel, &out, &shutdown);
                    }
                }
                Some(block) = self.new_block_rx.recv() => {
                    if let Some(c) = miner_cancel.take() {
                        c.cancel();
                    }
                    mining = false;
                    self.accept(block);
                    self.launch(&mut mining, &mut miner_cancel, &out, &shutdown);
                }
            }
        }
    }

    fn accept(&self, block: Block) {
        let txs = block.txs.clone();
        let number = block.header.number;
        let miner = block.header.miner.clone();
        let result = self.state.write().add_block(block);
        match result {
            Ok(hash) => {
                self.mempool.lock().complete(&txs);
                if let Some(events) = &self.events {
                    let _ = events.send(NodeEvent::BlockAccepted { number, hash, miner });
                }
            }
            Err(e) => warn!(error = %e, "block rejected"),
        }
    }

    fn launch(
        &self,
        mining: &mut bool,
        miner_cancel: &mut Option<CancellationToken>,
        out: &mpsc::UnboundedSender<Block>,
        shutdown: &CancellationToken,
    ) {
        let txs = self.mempool.lock().pending_snapshot();
        if txs.is_empty() {
            *mining = false;
            return;
        }

        let (parent, number) = {
            let state = self.state.read();
            (state.last_hash(), state.next_block_number())
        };
        let now = chrono::Utc::now().timestamp() as u64;
        let candidate = Block::new(parent, number, now, self.miner_account.clone(), txs);

        let child = shutdown.child_token();
        debug!(number, "launching miner");
        tokio::spawn(pow::mine_and_emit(candidate, DIFFICULTY, child.clone(), out.clone()));
        *miner_cancel = Some(child);
        *mining = true;
    }
}
