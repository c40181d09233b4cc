pub mod block;
pub mod config;
pub mod crypto;
pub mod error;
pub mod ledger;
pub mod merkle;
pub mod security;
pub mod transaction;

// Explicit re-exports to avoid ambiguous glob re-exports
pub use block::{Block, BlockHeader, calculate_block_hash};
pub use crypto::WalletKeypair;
pub use error::{ChainValidationError, SnapshotError};
pub use ledger::{Ledger, LedgerSnapshot};
pub use merkle::{Position, ProofStep, build_proof, compute_root, verify_proof};
pub use transaction::{Transaction, derive_id};
