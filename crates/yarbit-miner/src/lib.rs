//! # yarbit-miner
//!
//! Proof-of-work search ([`pow`]) and the mining supervisor ([`foreman`])
//! that launches, cancels, and re-launches it in response to mempool
//! activity and newly accepted blocks — local or remote.

pub mod foreman;
pub mod pow;

pub use foreman::Foreman;
