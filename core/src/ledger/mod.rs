mod snapshot;

pub use snapshot::LedgerSnapshot;

use crate::block::{Block, calculate_block_hash};
use crate::error::ChainValidationError;
use crate::merkle::{ProofStep, build_proof, verify_proof};
use crate::transaction::Transaction;
use chrono::Utc;
use std::collections::HashSet;

fn short(hash: &str) -> &str {
    hash.get(..16).unwrap_or(hash)
}

/// Append-only provenance ledger (in-memory)
///
/// Owns:
/// - the block sequence, starting at the fixed genesis block
/// - the pending pool (FIFO) awaiting the next mining call
/// - the revoked signer keys
///
/// There is no internal locking; a caller sharing one ledger between threads
/// must serialize every `&mut self` call so block indices stay contiguous.
#[derive(Debug, Clone)]
pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
    revoked: HashSet<String>,
}

impl Ledger {
    pub fn new() -> Self {
        let genesis = Block::genesis();
        log::info!("Ledger initialized with genesis {}", short(&genesis.hash));
        Ledger {
            chain: vec![genesis],
            pending: Vec::new(),
            revoked: HashSet::new(),
        }
    }

    /// Admit `tx` to the pending pool.
    ///
    /// Returns false (and leaves the pool untouched) iff the signer is revoked.
    /// The signature is not re-checked here; see `security::validate_submission`.
    pub fn add_transaction(&mut self, tx: Transaction) -> bool {
        if self.revoked.contains(&tx.signer_public_key) {
            log::warn!(
                "Rejected TX {}: signer {} is revoked",
                short(&tx.id),
                short(&tx.signer_public_key)
            );
            return false;
        }

        log::debug!("TX {} added to pool", short(&tx.id));
        self.pending.push(tx);
        true
    }

    /// Drain the pool into a new block linked to the current tip.
    ///
    /// Succeeds on an empty pool too, producing a block that commits to the
    /// empty root. Every call appends exactly one block.
    pub fn mine_pending_transactions(&mut self) -> &Block {
        let transactions = std::mem::take(&mut self.pending);
        let tx_count = transactions.len();
        let block = Block::assemble(
            self.chain.len() as u64,
            self.latest_block().hash.clone(),
            Utc::now().timestamp_millis(),
            rand::random::<u64>(),
            transactions,
        );

        log::info!(
            "⛏️  Mined block {} with {} transaction(s): {}",
            block.header.index,
            tx_count,
            short(&block.hash)
        );

        self.chain.push(block);
        self.latest_block()
    }

    /// Add `public_key` to the revocation set.
    ///
    /// Only future `add_transaction` calls are affected; pooled and mined
    /// transactions by that key stay where they are. Revocation cannot be undone.
    /// Returns false when the key was already revoked.
    pub fn revoke_key(&mut self, public_key: &str) -> bool {
        let inserted = self.revoked.insert(public_key.to_string());
        if inserted {
            log::info!("Revoked signer key {}", short(public_key));
        } else {
            log::debug!("Signer key {} already revoked", short(public_key));
        }
        inserted
    }

    pub fn is_chain_valid(&self) -> bool {
        self.validate_chain().is_ok()
    }

    /// Walk blocks 1.. and stop at the first block whose hash, link, merkle
    /// root or transaction ids do not check out. Genesis is trusted as-is.
    ///
    /// Signer keys and signatures are not covered: they are not part of the id.
    pub fn validate_chain(&self) -> Result<(), ChainValidationError> {
        for (position, pair) in self.chain.windows(2).enumerate() {
            let (prev, block) = (&pair[0], &pair[1]);
            let index = position as u64 + 1;

            // 1) header hash match
            let computed = calculate_block_hash(&block.header);
            if computed != block.hash {
                log::warn!(
                    "🚫 Block validation failed [hash_mismatch]: height={} computed={} actual={}",
                    index,
                    short(&computed),
                    short(&block.hash)
                );
                return Err(ChainValidationError::HashMismatch {
                    index,
                    stored: block.hash.clone(),
                    computed,
                });
            }

            // 2) link to previous
            if block.header.previous_hash != prev.hash {
                log::warn!(
                    "🚫 Block validation failed [previous_hash_mismatch]: height={} prev_hash={} expected={}",
                    index,
                    short(&block.header.previous_hash),
                    short(&prev.hash)
                );
                return Err(ChainValidationError::PreviousHashMismatch {
                    index,
                    stored: block.header.previous_hash.clone(),
                    expected: prev.hash.clone(),
                });
            }

            // 3) merkle check
            let merkle = block.recompute_merkle_root();
            if merkle != block.header.merkle_root {
                log::warn!(
                    "🚫 Block validation failed [merkle_mismatch]: height={} computed={} header={}",
                    index,
                    short(&merkle),
                    short(&block.header.merkle_root)
                );
                return Err(ChainValidationError::MerkleRootMismatch {
                    index,
                    stored: block.header.merkle_root.clone(),
                    computed: merkle,
                });
            }

            // 4) every stored id still derives from its content
            if let Some(tx) = block.first_mismatched_id() {
                let computed = tx.compute_id();
                log::warn!(
                    "🚫 Block validation failed [txid_mismatch]: height={} txid={} computed={}",
                    index,
                    short(&tx.id),
                    short(&computed)
                );
                return Err(ChainValidationError::TransactionIdMismatch {
                    index,
                    stored: tx.id.clone(),
                    computed,
                });
            }
        }

        Ok(())
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    /// Revoked keys, sorted for stable display.
    pub fn revoked_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.revoked.iter().cloned().collect();
        keys.sort();
        keys
    }

    pub fn is_revoked(&self, public_key: &str) -> bool {
        self.revoked.contains(public_key)
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn latest_block(&self) -> &Block {
        // chain always holds at least genesis
        &self.chain[self.chain.len() - 1]
    }

    pub fn block(&self, index: u64) -> Option<&Block> {
        usize::try_from(index).ok().and_then(|i| self.chain.get(i))
    }

    /// Find a mined transaction and the index of the block holding it.
    pub fn find_transaction(&self, txid: &str) -> Option<(&Transaction, u64)> {
        self.chain.iter().find_map(|block| {
            block
                .transactions
                .iter()
                .find(|t| t.id == txid)
                .map(|t| (t, block.header.index))
        })
    }

    pub fn pending_transaction(&self, txid: &str) -> Option<&Transaction> {
        self.pending.iter().find(|t| t.id == txid)
    }

    /// Inclusion proof for `txid` inside block `block_index`.
    ///
    /// `None` if the block does not exist; an empty proof if the block exists
    /// but does not hold `txid`.
    pub fn merkle_proof(&self, block_index: u64, txid: &str) -> Option<Vec<ProofStep>> {
        let block = self.block(block_index)?;
        Some(build_proof(&block.transaction_ids(), txid))
    }

    /// Check a client-supplied proof against the block's stored merkle root.
    pub fn verify_merkle_proof(&self, block_index: u64, leaf: &str, proof: &[ProofStep]) -> bool {
        match self.block(block_index) {
            Some(block) => verify_proof(leaf, proof, &block.header.merkle_root),
            None => false,
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
