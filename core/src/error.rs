//! Error types for chain validation and snapshot import

use thiserror::Error;

/// First integrity violation found while walking the chain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainValidationError {
    #[error("block {index}: stored hash {stored} does not match recomputed {computed}")]
    HashMismatch {
        index: u64,
        stored: String,
        computed: String,
    },

    #[error("block {index}: previous_hash {stored} does not match preceding block hash {expected}")]
    PreviousHashMismatch {
        index: u64,
        stored: String,
        expected: String,
    },

    #[error("block {index}: stored merkle root {stored} does not match recomputed {computed}")]
    MerkleRootMismatch {
        index: u64,
        stored: String,
        computed: String,
    },

    #[error("block {index}: transaction id {stored} does not match its content (expected {computed})")]
    TransactionIdMismatch {
        index: u64,
        stored: String,
        computed: String,
    },
}

impl ChainValidationError {
    /// Position of the offending block in the chain.
    pub fn index(&self) -> u64 {
        match self {
            Self::HashMismatch { index, .. }
            | Self::PreviousHashMismatch { index, .. }
            | Self::MerkleRootMismatch { index, .. }
            | Self::TransactionIdMismatch { index, .. } => *index,
        }
    }

    /// Short name of the failed check.
    pub fn check(&self) -> &'static str {
        match self {
            Self::HashMismatch { .. } => "hash_mismatch",
            Self::PreviousHashMismatch { .. } => "previous_hash_mismatch",
            Self::MerkleRootMismatch { .. } => "merkle_mismatch",
            Self::TransactionIdMismatch { .. } => "txid_mismatch",
        }
    }
}

/// Reasons a snapshot cannot be turned back into a ledger.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot contains no blocks")]
    Empty,

    #[error("snapshot does not start with the canonical genesis block")]
    GenesisMismatch,

    #[error("block at position {position} carries index {index}")]
    IndexGap { position: u64, index: u64 },

    #[error("snapshot chain is invalid: {0}")]
    Invalid(#[from] ChainValidationError),

    #[error("snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
