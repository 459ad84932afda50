//! # yarbit-network
//!
//! Peer directory ([`peer`]), wire DTOs shared with the node's HTTP server
//! ([`dto`]), and the peer sync service that gossips over them ([`sync`]).

pub mod dto;
pub mod peer;
pub mod sync;

pub use peer::{PeerDirectory, PeerNode};
pub use sync::{ChainTip, ChainTipSource, SyncService};
