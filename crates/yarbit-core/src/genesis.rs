//! Genesis allocation: the balance table a chain starts from.
//!
//! Unlike a hardcoded protocol genesis block, this genesis is a small JSON
//! file written once per data directory on first startup. Every later
//! `State::load` reads it back and folds it with the block log.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::Account;

/// Default chain id stamped into a freshly created genesis file.
pub const DEFAULT_CHAIN_ID: &str = "yarbit";

/// The initial balance allocation a chain is derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genesis {
    pub chain_id: String,
    pub genesis_time: u64,
    pub balances: BTreeMap<Account, u64>,
}

impl Genesis {
    fn default_allocation(genesis_time: u64) -> Self {
        let mut balances = BTreeMap::new();
        balances.insert("andrej".to_string(), 1_000_000);
        Genesis {
            chain_id: DEFAULT_CHAIN_ID.to_string(),
            genesis_time,
            balances,
        }
    }

    /// Read the genesis file at `path`, writing a default allocation first
    /// if it does not exist.
    pub fn load_or_init(path: &Path) -> std::io::Result<Self> {
        if !path.exists() {
            let genesis_time = chrono::Utc::now().timestamp() as u64;
            let genesis = Self::default_allocation(genesis_time);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let bytes = serde_json::to_vec_pretty(&genesis)?;
            fs::write(path, bytes)?;
            return Ok(genesis);
        }
        let bytes = fs::read(path)?;
        let genesis: Genesis = serde_json::from_slice(&bytes)?;
        Ok(genesis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_default_genesis_on_first_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genesis.json");
        assert!(!path.exists());

        let genesis = Genesis::load_or_init(&path).unwrap();
        assert!(path.exists());
        assert_eq!(genesis.balances.get("andrej"), Some(&1_000_000));
        assert_eq!(genesis.chain_id, DEFAULT_CHAIN_ID);
    }

    #[test]
    fn reuses_existing_genesis_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genesis.json");

        let first = Genesis::load_or_init(&path).unwrap();
        let second = Genesis::load_or_init(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn respects_hand_edited_genesis() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genesis.json");

        let mut balances = BTreeMap::new();
        balances.insert("babayaga".to_string(), 42);
        let custom = Genesis {
            chain_id: "testnet".to_string(),
            genesis_time: 1000,
            balances,
        };
        fs::write(&path, serde_json::to_vec(&custom).unwrap()).unwrap();

        let loaded = Genesis::load_or_init(&path).unwrap();
        assert_eq!(loaded, custom);
    }
}
