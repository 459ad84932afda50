//! The typed event fan-out every long-lived task publishes lifecycle
//! notifications on.
//!
//! Earlier revisions of this ledger used a reflection-based publish/
//! subscribe topic so any listener could subscribe to any payload shape.
//! That is unnecessary here: the set of interesting events is small and
//! fixed, so a plain `tokio::sync::broadcast<NodeEvent>` gives the same
//! fan-out with compile-time checked payloads and no runtime reflection.

use crate::hash::Hash;

/// A lifecycle notification other components (chiefly the HTTP layer, for
/// future push-based status endpoints) may subscribe to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEvent {
    BlockAccepted { number: u64, hash: Hash, miner: String },
    PeerAdded { socket: String },
    PeerRemoved { socket: String },
    TxAdmitted { hash: Hash },
}

/// Convenience alias: every publisher and subscriber shares one channel
/// type and capacity policy.
pub type EventSender = tokio::sync::broadcast::Sender<NodeEvent>;
pub type EventReceiver = tokio::sync::broadcast::Receiver<NodeEvent>;

/// Construct a fresh event channel with the standard capacity.
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::broadcast::channel(256)
}
