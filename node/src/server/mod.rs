use crate::service::{self, SubmitOutcome, VerifyRequest};
use crate::{MAX_BODY_BYTES, NodeHandle};
use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::future::Future;
use std::net::SocketAddr;
use tracechain_core::Transaction;
use warp::Filter;
use warp::{http::StatusCode, reply::with_status};

#[derive(Deserialize)]
struct RevokeRequest {
    public_key: String,
}

fn json_status(
    value: serde_json::Value,
    status: StatusCode,
) -> warp::reply::WithStatus<warp::reply::Json> {
    with_status(warp::reply::json(&value), status)
}

/// Serve the ledger over HTTP on `addr` until the task is dropped.
pub async fn run_server(node: NodeHandle, addr: SocketAddr) {
    let node_filter = {
        let node = node.clone();
        warp::any().map(move || node.clone())
    };

    // GET /health
    let health_check = warp::path!("health")
        .and(warp::get())
        .and(node_filter.clone())
        .and_then(|node: NodeHandle| async move {
            let status = service::status(&node);
            Ok::<_, warp::Rejection>(warp::reply::json(&serde_json::json!({
                "status": "ok",
                "height": status.height,
                "tip": status.tip,
                "pending": status.pending,
                "revoked": status.revoked,
                "uptime_seconds": status.uptime_seconds,
                "timestamp": chrono::Utc::now().timestamp()
            })))
        });

    // -------------------------------
    // POST /tx  (client -> node), bincode body
    // -------------------------------
    let post_tx = warp::path!("tx")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::bytes())
        .and(node_filter.clone())
        .and_then(|body: bytes::Bytes, node: NodeHandle| async move {
            let tx = match Transaction::decode(&body) {
                Ok(tx) => {
                    log::info!("Received Transaction {}", tx.id);
                    tx
                }
                Err(e) => {
                    log::warn!("Invalid tx bincode: {}", e);
                    return Ok::<_, warp::Rejection>(json_status(
                        serde_json::json!({
                            "status": "error",
                            "message": "invalid bincode"
                        }),
                        StatusCode::BAD_REQUEST,
                    ));
                }
            };

            let txid = tx.id.clone();
            let now = chrono::Utc::now().timestamp_millis();
            let reply = match service::submit_transaction(&node, tx, now) {
                SubmitOutcome::Accepted => json_status(
                    serde_json::json!({
                        "status": "ok",
                        "message": "tx queued",
                        "id": txid
                    }),
                    StatusCode::OK,
                ),
                SubmitOutcome::Duplicate => json_status(
                    serde_json::json!({
                        "status": "duplicate",
                        "id": txid
                    }),
                    StatusCode::OK,
                ),
                SubmitOutcome::Revoked => json_status(
                    serde_json::json!({
                        "status": "error",
                        "message": "signer key is revoked",
                        "id": txid
                    }),
                    StatusCode::FORBIDDEN,
                ),
                SubmitOutcome::Invalid(message) => json_status(
                    serde_json::json!({
                        "status": "error",
                        "message": message,
                        "id": txid
                    }),
                    StatusCode::BAD_REQUEST,
                ),
            };
            Ok::<_, warp::Rejection>(reply)
        });

    // POST /mine
    let post_mine = warp::path!("mine")
        .and(warp::post())
        .and(node_filter.clone())
        .and_then(|node: NodeHandle| async move {
            let block = service::mine(&node);
            Ok::<_, warp::Rejection>(warp::reply::json(&serde_json::json!({
                "status": "ok",
                "index": block.header.index,
                "hash": block.hash,
                "merkle_root": block.header.merkle_root,
                "transactions": block.transactions.len(),
                "block": block
            })))
        });

    // POST /revoke {"public_key": "..."}
    let post_revoke = warp::path!("revoke")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(node_filter.clone())
        .and_then(|req: RevokeRequest, node: NodeHandle| async move {
            let public_key = req.public_key.trim().to_string();
            if public_key.is_empty() {
                return Ok::<_, warp::Rejection>(json_status(
                    serde_json::json!({
                        "status": "error",
                        "message": "public_key is empty"
                    }),
                    StatusCode::BAD_REQUEST,
                ));
            }

            let newly_revoked = service::revoke(&node, &public_key);
            Ok::<_, warp::Rejection>(json_status(
                serde_json::json!({
                    "status": "ok",
                    "public_key": public_key,
                    "newly_revoked": newly_revoked
                }),
                StatusCode::OK,
            ))
        });

    // GET /chain
    let get_chain = warp::path!("chain")
        .and(warp::get())
        .and(node_filter.clone())
        .and_then(|node: NodeHandle| async move {
            let blocks = service::chain(&node);
            log::debug!("Returning {} blocks", blocks.len());
            Ok::<_, warp::Rejection>(warp::reply::json(&serde_json::json!({
                "length": blocks.len(),
                "blocks": blocks
            })))
        });

    // GET /chain/validate
    let get_validate = warp::path!("chain" / "validate")
        .and(warp::get())
        .and(node_filter.clone())
        .and_then(|node: NodeHandle| async move {
            let report = service::validate(&node);
            Ok::<_, warp::Rejection>(warp::reply::json(&report))
        });

    // GET /mempool
    let get_mempool = warp::path!("mempool")
        .and(warp::get())
        .and(node_filter.clone())
        .and_then(|node: NodeHandle| async move {
            let txs = service::mempool(&node);
            Ok::<_, warp::Rejection>(warp::reply::json(&serde_json::json!({
                "count": txs.len(),
                "transactions": txs
            })))
        });

    // GET /revoked
    let get_revoked = warp::path!("revoked")
        .and(warp::get())
        .and(node_filter.clone())
        .and_then(|node: NodeHandle| async move {
            let keys = service::revoked_keys(&node);
            Ok::<_, warp::Rejection>(warp::reply::json(&serde_json::json!({
                "count": keys.len(),
                "revoked_keys": keys
            })))
        });

    // GET /tx/{txid}
    let get_tx = warp::path!("tx" / String)
        .and(warp::get())
        .and(node_filter.clone())
        .and_then(|txid: String, node: NodeHandle| async move {
            match service::lookup_transaction(&node, &txid) {
                Some(location) => Ok::<_, warp::Rejection>(with_status(
                    warp::reply::json(&location),
                    StatusCode::OK,
                )),
                None => Ok::<_, warp::Rejection>(json_status(
                    serde_json::json!({
                        "error": "tx not found",
                        "id": txid
                    }),
                    StatusCode::NOT_FOUND,
                )),
            }
        });

    // GET /block/{index}/proof/{txid}
    let get_proof = warp::path!("block" / u64 / "proof" / String)
        .and(warp::get())
        .and(node_filter.clone())
        .and_then(|index: u64, txid: String, node: NodeHandle| async move {
            match service::proof_for(&node, index, &txid) {
                Some(proof) => Ok::<_, warp::Rejection>(with_status(
                    warp::reply::json(&proof),
                    StatusCode::OK,
                )),
                None => Ok::<_, warp::Rejection>(json_status(
                    serde_json::json!({
                        "error": "block not found",
                        "index": index
                    }),
                    StatusCode::NOT_FOUND,
                )),
            }
        });

    // POST /block/{index}/verify {"leaf": "...", "proof": [...]}
    let post_verify = warp::path!("block" / u64 / "verify")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(node_filter.clone())
        .and_then(|index: u64, req: VerifyRequest, node: NodeHandle| async move {
            match service::verify_for(&node, index, &req) {
                Some(result) => Ok::<_, warp::Rejection>(with_status(
                    warp::reply::json(&result),
                    StatusCode::OK,
                )),
                None => Ok::<_, warp::Rejection>(json_status(
                    serde_json::json!({
                        "error": "block not found",
                        "index": index
                    }),
                    StatusCode::NOT_FOUND,
                )),
            }
        });

    // GET /snapshot
    let get_snapshot = warp::path!("snapshot")
        .and(warp::get())
        .and(node_filter.clone())
        .and_then(|node: NodeHandle| async move {
            let snapshot = service::snapshot(&node);
            Ok::<_, warp::Rejection>(warp::reply::json(&snapshot))
        });

    // -------------------------------
    // combine routes
    let routes = health_check
        .or(post_tx)
        .or(post_mine)
        .or(post_revoke)
        .or(get_validate)
        .or(get_chain)
        .or(get_mempool)
        .or(get_revoked)
        .or(get_tx)
        .or(get_proof)
        .or(post_verify)
        .or(get_snapshot)
        .with(warp::log("tracechain::http"))
        .boxed();

    println!("HTTP server running at http://{}", addr);

    warp::serve(routes).run(addr).await;
}

/// Run the HTTP server until `shutdown` resolves.
///
/// Fails if the server task ends first, e.g. when `addr` cannot be bound.
pub async fn serve_until<F>(node: NodeHandle, addr: SocketAddr, shutdown: F) -> Result<()>
where
    F: Future<Output = std::io::Result<()>>,
{
    let mut server = tokio::spawn(run_server(node, addr));

    tokio::select! {
        joined = &mut server => match joined {
            Ok(()) => Err(anyhow!("HTTP server on {} stopped unexpectedly", addr)),
            Err(e) => Err(anyhow!("HTTP server on {} failed: {}", addr, e)),
        },
        signal = shutdown => {
            server.abort();
            signal.context("couldn't listen for shutdown signal")
        }
    }
}
