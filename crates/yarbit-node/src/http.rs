//! HTTP server: translates the wire API into calls on a [`NodeHandle`].
//!
//! Routes and wire shapes are defined by the DTOs in `yarbit-network::dto`;
//! this module only wires axum extractors onto handle accessors.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use yarbit_core::hash::Hash;
use yarbit_network::dto::{
    BalancesListResponse, PeerAddResponse, StatusResponse, SyncResponse, TxAddRequest,
    TxAddResponse,
};
use yarbit_network::PeerNode;

use crate::node::NodeHandle;

pub fn router(handle: NodeHandle) -> Router {
    Router::new()
        .route("/node/status", get(node_status))
        .route("/node/sync", get(node_sync))
        .route("/node/peer", post(node_peer))
        .route("/tx/add", post(tx_add))
        .route("/balances/list", get(balances_list))
        .with_state(handle)
}

/// Bind to `handle.config().self_socket()` and serve until `shutdown` fires.
pub async fn serve(handle: NodeHandle, shutdown: CancellationToken) -> std::io::Result<()> {
    let socket = handle.config().self_socket();
    let app = router(handle);
    let listener = TcpListener::bind(&socket).await?;
    info!(%socket, "http server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

async fn node_status(State(handle): State<NodeHandle>) -> impl IntoResponse {
    let (block_hash, block_number) = {
        let state = handle.state();
        let state = state.read();
        (state.last_hash(), state.tip_number())
    };
    let known_peers = handle.peers().lock().snapshot();
    let pending_txs = handle.mempool().lock().pending_snapshot();
    Json(StatusResponse { block_hash, block_number, known_peers, pending_txs })
}

#[derive(Debug, Deserialize, Default)]
pub struct SyncQuery {
    #[serde(default)]
    after: String,
}

async fn node_sync(
    State(handle): State<NodeHandle>,
    Query(query): Query<SyncQuery>,
) -> impl IntoResponse {
    let after = if query.after.is_empty() {
        None
    } else {
        match Hash::from_hex(&query.after) {
            Ok(h) => Some(h),
            Err(e) => {
                warn!(error = %e, "malformed after hash in /node/sync");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": e.to_string() })),
                )
                    .into_response();
            }
        }
    };

    let store = handle.state().read().store();
    match store.read(after.as_ref(), u64::MAX) {
        Ok(blocks) => Json(SyncResponse { blocks }).into_response(),
        Err(e) => {
            warn!(error = %e, "block store read failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn node_peer(
    State(handle): State<NodeHandle>,
    Json(peer): Json<PeerNode>,
) -> impl IntoResponse {
    let inserted = handle.peers().lock().add_peer(peer.clone());
    if inserted {
        info!(socket = %peer.socket(), "peer added via http");
    }
    Json(PeerAddResponse {
        success: inserted,
        message: if inserted {
            "peer added".to_string()
        } else {
            "peer rejected: inactive, self, or already known".to_string()
        },
    })
}

async fn tx_add(
    State(handle): State<NodeHandle>,
    Json(req): Json<TxAddRequest>,
) -> impl IntoResponse {
    let tx_hash = handle.add_tx(req.from, req.to, req.value, req.data);
    Json(TxAddResponse { tx_hash })
}

async fn balances_list(State(handle): State<NodeHandle>) -> impl IntoResponse {
    let block_hash = handle.tip_hash();
    let balances = handle.balances();
    Json(BalancesListResponse { block_hash, balances })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NodeConfig;
    use crate::node::Node;

    fn test_handle() -> (NodeHandle, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = NodeConfig { data_dir: dir.path().to_path_buf(), ..NodeConfig::default() };
        let node = Node::new(config).unwrap();
        (node.handle(), dir)
    }

    #[tokio::test]
    async fn node_status_reports_genesis_tip() {
        let (handle, _dir) = test_handle();
        let resp = node_status(State(handle)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn node_peer_accepts_new_peer() {
        let (handle, _dir) = test_handle();
        let peer = PeerNode::new("10.0.0.5", 9000);
        let _ = node_peer(State(handle.clone()), Json(peer)).await;
        assert_eq!(handle.peers().lock().len(), 1);
    }

    #[tokio::test]
    async fn tx_add_admits_into_mempool() {
        let (handle, _dir) = test_handle();
        let req = TxAddRequest {
            from: "andrej".into(),
            to: "babayaga".into(),
            value: 5,
            data: String::new(),
        };
        let _ = tx_add(State(handle.clone()), Json(req)).await;
        assert_eq!(handle.mempool().lock().pending_len(), 1);
    }

    #[tokio::test]
    async fn balances_list_reports_genesis_balance() {
        let (handle, _dir) = test_handle();
        let _ = balances_list(State(handle.clone())).await;
        assert_eq!(*handle.balances().get("andrej").unwrap(), 1_000_000);
    }

    #[tokio::test]
    async fn node_sync_rejects_malformed_after() {
        let (handle, _dir) = test_handle();
        let query = SyncQuery { after: "not-hex".to_string() };
        let resp = node_sync(State(handle), Query(query)).await.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn node_sync_empty_after_returns_empty_chain() {
        let (handle, _dir) = test_handle();
        let query = SyncQuery::default();
        let resp = node_sync(State(handle), Query(query)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
