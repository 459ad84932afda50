//! Test-only constructors for states, mined blocks, and running nodes.

use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use yarbit_core::constants::DIFFICULTY;
use yarbit_core::hash::Hash;
use yarbit_core::types::{Block, Tx};
use yarbit_miner::pow;
use yarbit_node::{Node, NodeConfig, NodeHandle};

/// Build and mine a block on top of `parent`/`number`, crediting `miner`
/// with the block reward via the usual transaction set. Bypasses a running
/// node's mempool and HTTP API so tests can pre-seed a block log quickly.
pub fn mined_block(parent: Hash, number: u64, miner: &str, txs: Vec<Tx>) -> Block {
    let candidate = Block::new(parent, number, number, miner.to_string(), txs);
    let cancel = CancellationToken::new();
    pow::search(candidate, DIFFICULTY, &cancel).expect("search never cancelled in tests")
}

/// Hands out distinct loopback ports so concurrently-running scenario tests
/// never collide on a bind address.
fn next_port() -> u16 {
    static NEXT: AtomicU16 = AtomicU16::new(21_000);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

/// A node running for real: its HTTP server is bound to a loopback socket
/// and its mining supervisor and peer sync service are both live, exactly
/// as `yarbit run` starts them.
pub struct RunningNode {
    pub handle: NodeHandle,
    pub socket: String,
    shutdown: CancellationToken,
    node_task: JoinHandle<()>,
    http_task: JoinHandle<std::io::Result<()>>,
}

impl RunningNode {
    /// Stop the mining supervisor, sync service, and HTTP server and wait
    /// for all three to exit.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        let _ = self.node_task.await;
        let _ = self.http_task.await;
    }
}

/// Start a full node backed by `data_dir`, optionally bootstrapped to
/// `bootstrap`, and wait until its HTTP server is accepting connections.
pub async fn spawn_node(data_dir: std::path::PathBuf, bootstrap: Option<yarbit_network::PeerNode>) -> RunningNode {
    let port = next_port();
    let config = NodeConfig {
        data_dir,
        ip: "127.0.0.1".to_string(),
        port,
        bootstrap,
        miner_account: "anonymous".to_string(),
    };
    let socket = config.self_socket();

    let node = Node::new(config).expect("state loads from a fresh or pre-seeded data_dir");
    let handle = node.handle();
    let shutdown = CancellationToken::new();

    let node_task = tokio::spawn(node.run(shutdown.child_token()));
    let http_task = tokio::spawn(yarbit_node::http::serve(handle.clone(), shutdown.child_token()));

    wait_until(Duration::from_secs(2), || {
        let socket = socket.clone();
        async move { tokio::net::TcpStream::connect(&socket).await.is_ok() }
    })
    .await;

    RunningNode { handle, socket, shutdown, node_task, http_task }
}

/// Poll `condition` every 25ms until it returns `true` or `timeout` elapses.
/// Panics on timeout so failures point at the assertion that never became
/// true rather than a generic test hang.
pub async fn wait_until<F, Fut>(timeout: Duration, mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition().await {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("condition did not become true within {timeout:?}");
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}
