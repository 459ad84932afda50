//! Protocol constants shared by every component.

/// Number of leading zero bytes a block hash must have to satisfy proof-of-work.
pub const DIFFICULTY: usize = 3;

/// Reward credited to the miner of an accepted block, in addition to any
/// reward transactions the block itself carries.
pub const BLOCK_REWARD: u64 = 10;

/// Marker used in [`crate::types::Tx::data`] to identify a reward transaction
/// (no sender debit).
pub const REWARD_DATA: &str = "reward";

/// Cap on the mempool's completed-transaction set. Oldest entries are
/// evicted first; eviction never affects acceptance, only memory use.
pub const MAX_COMPLETED_TXS: usize = 10_000;

/// Interval between mining-supervisor ticks and peer-sync ticks.
pub const TICK_INTERVAL_SECS: u64 = 10;

/// Timeout applied to each outbound peer HTTP call.
pub const PEER_TIMEOUT_SECS: u64 = 5;

/// Name of the subdirectory under a node's data directory holding the
/// genesis file and block log.
pub const DATABASE_DIR: &str = "database";

/// Filename of the genesis allocation, relative to [`DATABASE_DIR`].
pub const GENESIS_FILENAME: &str = "genesis.json";

/// Filename of the append-only block log, relative to [`DATABASE_DIR`].
pub const BLOCK_DB_FILENAME: &str = "block.db";

/// Port a node listens on when `--port` is not given.
pub const DEFAULT_HTTP_PORT: u16 = 8080;
