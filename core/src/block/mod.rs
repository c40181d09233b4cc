use crate::config::{GENESIS_NONCE, GENESIS_PREVIOUS_HASH, GENESIS_TIMESTAMP};
use crate::crypto::hash_hex;
use crate::merkle::compute_root;
use crate::transaction::Transaction;
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// block header
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub index: u64,
    pub previous_hash: String, // hex, "0" for genesis
    pub timestamp: i64,        // unix millis
    pub merkle_root: String,   // hex
    pub nonce: u64,            // not checked by anything
}

#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
    pub hash: String, // hex string (computed from header fields)
}

/// Block hash over the header fields only, in order
/// `index, previous_hash, timestamp, merkle_root, nonce`.
///
/// Transactions enter only through `merkle_root`. Mining and chain validation
/// both call this, so they always agree on the hashing policy.
pub fn calculate_block_hash(header: &BlockHeader) -> String {
    let material = format!(
        "{}{}{}{}{}",
        header.index, header.previous_hash, header.timestamp, header.merkle_root, header.nonce
    );
    hash_hex(material.as_bytes())
}

impl Block {
    /// Build a block over `transactions`, committing to their ids and sealing the header.
    pub fn assemble(
        index: u64,
        previous_hash: String,
        timestamp: i64,
        nonce: u64,
        transactions: Vec<Transaction>,
    ) -> Self {
        let txids: Vec<&str> = transactions.iter().map(|t| t.id.as_str()).collect();
        let header = BlockHeader {
            index,
            previous_hash,
            timestamp,
            merkle_root: compute_root(&txids),
            nonce,
        };
        let hash = calculate_block_hash(&header);
        Block {
            header,
            transactions,
            hash,
        }
    }

    /// Fixed first block of every ledger.
    pub fn genesis() -> Self {
        Self::assemble(
            0,
            GENESIS_PREVIOUS_HASH.to_string(),
            GENESIS_TIMESTAMP,
            GENESIS_NONCE,
            Vec::new(),
        )
    }

    pub fn transaction_ids(&self) -> Vec<String> {
        self.transactions.iter().map(|t| t.id.clone()).collect()
    }

    pub fn contains(&self, txid: &str) -> bool {
        self.transactions.iter().any(|t| t.id == txid)
    }

    pub fn recompute_hash(&self) -> String {
        calculate_block_hash(&self.header)
    }

    /// Merkle root over the stored transaction ids, in block order.
    pub fn recompute_merkle_root(&self) -> String {
        compute_root(&self.transaction_ids())
    }

    /// First transaction whose stored id no longer matches its content.
    pub fn first_mismatched_id(&self) -> Option<&Transaction> {
        self.transactions.iter().find(|t| !t.has_valid_id())
    }
}
