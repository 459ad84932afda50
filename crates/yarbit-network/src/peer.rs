//! Known-peer bookkeeping.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A known peer node, identified by its `ip:port` socket string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerNode {
    pub ip: String,
    pub port: u16,
    #[serde(default)]
    pub is_bootstrap: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl PeerNode {
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        PeerNode {
            ip: ip.into(),
            port,
            is_bootstrap: false,
            is_active: true,
        }
    }

    pub fn socket(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

/// The set of peers this node knows about, keyed by socket string. Never
/// contains the node's own socket.
#[derive(Default)]
pub struct PeerDirectory {
    self_socket: String,
    peers: HashMap<String, PeerNode>,
}

impl PeerDirectory {
    pub fn new(self_socket: impl Into<String>) -> Self {
        PeerDirectory {
            self_socket: self_socket.into(),
            peers: HashMap::new(),
        }
    }

    /// Insert `peer` unless it is inactive, is this node itself, or is
    /// already known. Returns whether it was inserted.
    pub fn add_peer(&mut self, peer: PeerNode) -> bool {
        if !peer.is_active {
            return false;
        }
        let socket = peer.socket();
        if socket == self.self_socket {
            return false;
        }
        if self.peers.contains_key(&socket) {
            return false;
        }
        self.peers.insert(socket, peer);
        true
    }

    pub fn remove_peer(&mut self, socket: &str) -> Option<PeerNode> {
        self.peers.remove(socket)
    }

    pub fn snapshot(&self) -> HashMap<String, PeerNode> {
        self.peers.clone()
    }

    pub fn contains(&self, socket: &str) -> bool {
        self.peers.contains_key(socket)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn self_socket(&self) -> &str {
        &self.self_socket
    }
}
