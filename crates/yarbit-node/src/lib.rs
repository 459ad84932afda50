//! # yarbit-node
//!
//! Composes [`node::Node`] (state, mempool, peer directory, miner, sync)
//! with the [`http`] server and [`config::NodeConfig`] into a runnable
//! full node.

pub mod config;
pub mod http;
pub mod node;

pub use config::NodeConfig;
pub use node::{Node, NodeHandle};
