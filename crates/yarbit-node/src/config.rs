//! Node configuration: resolved CLI settings for a running yarbit node.

use std::path::PathBuf;

use yarbit_core::constants::DEFAULT_HTTP_PORT;
use yarbit_network::PeerNode;

/// The fully resolved configuration a [`crate::node::Node`] is built from.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Root directory for the genesis file and block log.
    pub data_dir: PathBuf,
    /// IP address the HTTP server binds to and advertises to peers.
    pub ip: String,
    /// Port the HTTP server binds to and advertises to peers.
    pub port: u16,
    /// Peer to introduce ourselves to on startup, if any.
    pub bootstrap: Option<PeerNode>,
    /// Account credited with `BLOCK_REWARD` for every block this node mines.
    pub miner_account: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("yarbit");

        Self {
            data_dir,
            ip: "127.0.0.1".to_string(),
            port: DEFAULT_HTTP_PORT,
            bootstrap: None,
            miner_account: "anonymous".to_string(),
        }
    }
}

impl NodeConfig {
    /// Socket string this node advertises as its own: `ip:port`.
    pub fn self_socket(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }

    /// This node's own `PeerNode` record, as presented to other peers.
    pub fn self_peer(&self) -> PeerNode {
        PeerNode::new(self.ip.clone(), self.port)
    }
}
