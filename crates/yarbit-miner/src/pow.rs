//! Proof-of-work nonce search.
//!
//! The search increments `header.nonce` from 0 through `u32::MAX`,
//! re-hashing the whole block each step. If the nonce space is exhausted
//! without finding a hash that meets the difficulty, `header.time` is
//! advanced by one second and the nonce resets to 0 — this keeps the
//! search live indefinitely rather than giving up, since proof-of-work is
//! expected to eventually succeed.

use tokio_util::sync::CancellationToken;
use yarbit_core::types::Block;

/// Search for a valid nonce, checking `cancel` before every hash attempt.
///
/// Returns `None` immediately if `block` carries no transactions (nothing
/// worth mining), or if `cancel` fires before a valid nonce is found.
/// Blocking: intended to be run on a dedicated thread (see [`spawn`]).
pub fn search(mut block: Block, difficulty: usize, cancel: &CancellationToken) -> Option<Block> {
    if block.txs.is_empty() {
        return None;
    }
    loop {
        loop {
            if cancel.is_cancelled() {
                return None;
            }
            if block.meets_pow(difficulty) {
                return Some(block);
            }
            if block.header.nonce == u32::MAX {
                break;
            }
            block.header.nonce += 1;
        }
        block.header.time += 1;
        block.header.nonce = 0;
    }
}

/// Run [`search`] on a blocking thread and, on success, emit the mined
/// block on `out`. Swallows send failures: a closed channel means the
/// supervisor has shut down and no one is listening anymore.
pub async fn mine_and_emit(
    block: Block,
    difficulty: usize,
    cancel: CancellationToken,
    out: tokio::sync::mpsc::UnboundedSender<Block>,
) {
    let result =
        tokio::task::spawn_blocking(move || search(block, difficulty, &cancel)).await;
    if let Ok(Some(mined)) = result {
        let _ = out.send(mined);
    }
}
