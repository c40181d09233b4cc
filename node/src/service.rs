//! Request handling behind the HTTP routes.
//!
//! Each function takes the node handle, holds the lock only for the duration
//! of the ledger call and returns owned data, so the warp handlers never keep
//! a guard alive across an await point.

use crate::NodeHandle;
use serde::{Deserialize, Serialize};
use tracechain_core::merkle::{self, ProofStep};
use tracechain_core::security::validate_submission;
use tracechain_core::{Block, LedgerSnapshot, Transaction};

/// Result of `POST /tx`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted,
    /// Same id already pooled or mined; nothing changed.
    Duplicate,
    /// Signer key has been revoked.
    Revoked,
    /// Failed the submission checks (size, timestamp, id, signature).
    Invalid(String),
}

pub fn submit_transaction(node: &NodeHandle, tx: Transaction, now_ms: i64) -> SubmitOutcome {
    if let Err(e) = validate_submission(&tx, now_ms) {
        log::warn!("TX {} rejected: {}", tx.id, e);
        return SubmitOutcome::Invalid(e.to_string());
    }

    let mut state = node.lock();
    if state.ledger.pending_transaction(&tx.id).is_some()
        || state.ledger.find_transaction(&tx.id).is_some()
    {
        log::info!("Duplicate TX {}", tx.id);
        return SubmitOutcome::Duplicate;
    }

    let txid = tx.id.clone();
    if state.ledger.add_transaction(tx) {
        log::info!("TX {} queued ({} pending)", txid, state.ledger.pending().len());
        SubmitOutcome::Accepted
    } else {
        SubmitOutcome::Revoked
    }
}

pub fn mine(node: &NodeHandle) -> Block {
    let mut state = node.lock();
    state.ledger.mine_pending_transactions().clone()
}

/// Returns false when the key was already revoked.
pub fn revoke(node: &NodeHandle, public_key: &str) -> bool {
    node.lock().ledger.revoke_key(public_key)
}

pub fn chain(node: &NodeHandle) -> Vec<Block> {
    node.lock().ledger.chain().to_vec()
}

pub fn mempool(node: &NodeHandle) -> Vec<Transaction> {
    node.lock().ledger.pending().to_vec()
}

pub fn revoked_keys(node: &NodeHandle) -> Vec<String> {
    node.lock().ledger.revoked_keys()
}

pub fn snapshot(node: &NodeHandle) -> LedgerSnapshot {
    node.lock().ledger.snapshot()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub index: u64,
    pub check: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub height: u64,
    pub failure: Option<ValidationFailure>,
}

pub fn validate(node: &NodeHandle) -> ValidationReport {
    let state = node.lock();
    let height = state.ledger.len() as u64;
    match state.ledger.validate_chain() {
        Ok(()) => ValidationReport {
            valid: true,
            height,
            failure: None,
        },
        Err(e) => ValidationReport {
            valid: false,
            height,
            failure: Some(ValidationFailure {
                index: e.index(),
                check: e.check().to_string(),
                message: e.to_string(),
            }),
        },
    }
}

/// Where a transaction currently lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TxLocation {
    Mined {
        block_index: u64,
        transaction: Transaction,
    },
    Pending {
        transaction: Transaction,
    },
}

pub fn lookup_transaction(node: &NodeHandle, txid: &str) -> Option<TxLocation> {
    let state = node.lock();
    if let Some((tx, block_index)) = state.ledger.find_transaction(txid) {
        return Some(TxLocation::Mined {
            block_index,
            transaction: tx.clone(),
        });
    }
    state
        .ledger
        .pending_transaction(txid)
        .map(|tx| TxLocation::Pending {
            transaction: tx.clone(),
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofResponse {
    pub block_index: u64,
    pub tx_id: String,
    pub merkle_root: String,
    /// False when the block exists but does not hold `tx_id`; `proof` is then empty.
    pub found: bool,
    pub proof: Vec<ProofStep>,
}

/// `None` when the block does not exist.
pub fn proof_for(node: &NodeHandle, block_index: u64, txid: &str) -> Option<ProofResponse> {
    let state = node.lock();
    let block = state.ledger.block(block_index)?;
    let proof = state.ledger.merkle_proof(block_index, txid)?;
    Some(ProofResponse {
        block_index,
        tx_id: txid.to_string(),
        merkle_root: block.header.merkle_root.clone(),
        found: block.contains(txid),
        proof,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub leaf: String,
    #[serde(default)]
    pub proof: Vec<ProofStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub block_index: u64,
    pub valid: bool,
    pub stored_root: String,
    pub computed_root: String,
    /// Intermediate hashes of the fold, leaf first.
    pub path: Vec<String>,
}

/// Check a client-supplied proof against block `block_index`. `None` when the
/// block does not exist.
pub fn verify_for(node: &NodeHandle, block_index: u64, req: &VerifyRequest) -> Option<VerifyResponse> {
    let state = node.lock();
    let block = state.ledger.block(block_index)?;
    let path = merkle::fold_path(&req.leaf, &req.proof);
    let computed_root = path.last().cloned().unwrap_or_else(|| req.leaf.clone());
    let valid = state
        .ledger
        .verify_merkle_proof(block_index, &req.leaf, &req.proof);

    if !valid {
        log::debug!(
            "Proof for leaf {} does not reach root of block {}",
            req.leaf,
            block_index
        );
    }

    Some(VerifyResponse {
        block_index,
        valid,
        stored_root: block.header.merkle_root.clone(),
        computed_root,
        path,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub height: u64,
    pub tip: String,
    pub pending: usize,
    pub revoked: usize,
    pub uptime_seconds: u64,
}

pub fn status(node: &NodeHandle) -> NodeStatus {
    let state = node.lock();
    NodeStatus {
        height: state.ledger.len() as u64,
        tip: state.ledger.latest_block().hash.clone(),
        pending: state.ledger.pending().len(),
        revoked: state.ledger.revoked_keys().len(),
        uptime_seconds: state.node_start_time.elapsed().as_secs(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeState;
    use tracechain_core::WalletKeypair;

    const NOW: i64 = 1_750_000_000_000;

    #[test]
    fn invalid_submission_is_reported_before_the_lock() {
        let node = NodeState::default().into_handle();
        let keypair = WalletKeypair::new();
        let mut tx = Transaction::sign(&keypair, "Salt", "Harvested", NOW);
        tx.details = "Imported".to_string();

        match submit_transaction(&node, tx, NOW) {
            SubmitOutcome::Invalid(msg) => assert!(msg.contains("does not match")),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(mempool(&node).is_empty());
    }

    #[test]
    fn status_tracks_the_ledger() {
        let node = NodeState::default().into_handle();
        let keypair = WalletKeypair::new();
        submit_transaction(&node, Transaction::sign(&keypair, "Salt", "Packed", NOW), NOW);
        revoke(&node, &keypair.public_hex());

        let s = status(&node);
        assert_eq!(s.height, 1);
        assert_eq!(s.pending, 1);
        assert_eq!(s.revoked, 1);

        let block = mine(&node);
        assert_eq!(status(&node).tip, block.hash);
        assert_eq!(status(&node).pending, 0);
    }
}
