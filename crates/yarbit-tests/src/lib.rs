//! Shared scaffolding for the scenario tests under `tests/`.
//!
//! Nothing in this crate is meant to be consumed outside its own test
//! binaries; it exists only to keep `tests/scenarios.rs` focused on the
//! scenarios themselves.

pub mod helpers;
