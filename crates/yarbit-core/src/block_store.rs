//! Append-only, newline-delimited JSON block log.
//!
//! One [`BlockLogEntry`] per line. Writers take an exclusive lock; readers
//! take a shared lock. A missing file is treated as an empty chain rather
//! than an error, so a brand-new data directory can be read from
//! immediately.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::BlockStoreError;
use crate::hash::Hash;
use crate::types::{Block, BlockLogEntry};

/// Handle to an append-only block log backed by a single file on disk.
pub struct FileBlockStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl FileBlockStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileBlockStore {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    /// Append `blocks` to the log, one JSON line per block, flushed before
    /// returning. Returns the hash of the last block written.
    ///
    /// Returns `None` if `blocks` is empty — there is nothing to report a
    /// hash for.
    pub fn write(&self, blocks: &[Block]) -> Result<Option<Hash>, BlockStoreError> {
        if blocks.is_empty() {
            return Ok(None);
        }
        let _guard = self.lock.write();
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut last = Hash::ZERO;
        for block in blocks {
            let hash = block.hash();
            let entry = BlockLogEntry {
                hash,
                block: block.clone(),
            };
            let mut line = serde_json::to_vec(&entry)
                .map_err(|e| BlockStoreError::Decode(e.to_string()))?;
            line.push(b'\n');
            file.write_all(&line)?;
            last = hash;
        }
        file.flush()?;
        Ok(Some(last))
    }

    /// Read up to `limit` blocks starting after the record whose stored
    /// hash equals `after` (from the beginning if `after` is `None`).
    ///
    /// An `after` hash that is absent from the log yields an empty result,
    /// never an error. A missing log file likewise yields an empty result.
    pub fn read(&self, after: Option<&Hash>, limit: u64) -> Result<Vec<Block>, BlockStoreError> {
        let _guard = self.lock.read();
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);

        let mut found_cursor = after.is_none();
        let mut out = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: BlockLogEntry = match serde_json::from_str(&line) {
                Ok(e) => e,
                Err(_) => break, // tolerate a truncated trailing line
            };
            if !found_cursor {
                if Some(&entry.hash) == after {
                    found_cursor = true;
                }
                continue;
            }
            out.push(entry.block);
            if out.len() as u64 >= limit {
                break;
            }
        }
        Ok(out)
    }

    /// Read every block ever written, in write order.
    pub fn read_all(&self) -> Result<Vec<Block>, BlockStoreError> {
        self.read(None, u64::MAX)
    }

    /// Spawn a background producer that repeatedly reads batches of
    /// `batch` blocks starting after `after`, emitting each on the returned
    /// channel. Terminates (dropping the sender) on a short batch or a
    /// read error.
    pub fn stream(
        self: Arc<Self>,
        after: Option<Hash>,
        batch: u64,
    ) -> tokio::sync::mpsc::Receiver<Block> {
        let (tx, rx) = tokio::sync::mpsc::channel(batch.max(1) as usize);
        tokio::spawn(async move {
            let mut cursor = after;
            loop {
                let store = self.clone();
                let cursor_arg = cursor;
                let result =
                    tokio::task::spawn_blocking(move || store.read(cursor_arg.as_ref(), batch))
                        .await;
                let blocks = match result {
                    Ok(Ok(blocks)) => blocks,
                    _ => break,
                };
                let got = blocks.len() as u64;
                for block in &blocks {
                    cursor = Some(block.hash());
                    if tx.send(block.clone()).await.is_err() {
                        return;
                    }
                }
                if got < batch {
                    break;
                }
            }
        });
        rx
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tx;

    fn block(number: u64, parent: Hash) -> Block {
        Block::new(parent, number, 1000 + number, "andrej".into(), vec![Tx::reward("andrej", 10)])
    }

    #[test]
    fn read_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBlockStore::new(dir.path().join("block.db"));
        assert!(store.read(None, 10).unwrap().is_empty());
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBlockStore::new(dir.path().join("block.db"));

        let b0 = block(0, Hash::ZERO);
        let h0 = store.write(&[b0.clone()]).unwrap().unwrap();
        assert_eq!(h0, b0.hash());

        let blocks = store.read(None, 10).unwrap();
        assert_eq!(blocks, vec![b0]);
    }

    #[test]
    fn read_after_cursor_skips_earlier_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBlockStore::new(dir.path().join("block.db"));

        let b0 = block(0, Hash::ZERO);
        let h0 = b0.hash();
        let b1 = block(1, h0);
        store.write(&[b0, b1.clone()]).unwrap();

        let blocks = store.read(Some(&h0), 10).unwrap();
        assert_eq!(blocks, vec![b1]);
    }

    #[test]
    fn read_respects_limit() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBlockStore::new(dir.path().join("block.db"));

        let b0 = block(0, Hash::ZERO);
        let b1 = block(1, b0.hash());
        store.write(&[b0, b1]).unwrap();

        let blocks = store.read(None, 1).unwrap();
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn read_with_unknown_cursor_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBlockStore::new(dir.path().join("block.db"));
        store.write(&[block(0, Hash::ZERO)]).unwrap();

        let unknown = Hash::from_bytes([9u8; 32]);
        assert!(store.read(Some(&unknown), 10).unwrap().is_empty());
    }

    #[test]
    fn write_empty_slice_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBlockStore::new(dir.path().join("block.db"));
        assert_eq!(store.write(&[]).unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn read_all_returns_write_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBlockStore::new(dir.path().join("block.db"));

        let b0 = block(0, Hash::ZERO);
        let b1 = block(1, b0.hash());
        let b2 = block(2, b1.hash());
        store.write(&[b0.clone()]).unwrap();
        store.write(&[b1.clone(), b2.clone()]).unwrap();

        assert_eq!(store.read_all().unwrap(), vec![b0, b1, b2]);
    }

    #[tokio::test]
    async fn stream_emits_every_block_then_closes() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileBlockStore::new(dir.path().join("block.db")));

        let b0 = block(0, Hash::ZERO);
        let b1 = block(1, b0.hash());
        let b2 = block(2, b1.hash());
        store.write(&[b0.clone(), b1.clone(), b2.clone()]).unwrap();

        let mut rx = store.clone().stream(None, 2);
        let mut received = Vec::new();
        while let Some(block) = rx.recv().await {
            received.push(block);
        }
        assert_eq!(received, vec![b0, b1, b2]);
    }
}
