//! Export/import of ledger state.
//!
//! A snapshot is the chain (in order) plus the revoked keys. The pending pool is
//! not included. Import re-validates everything instead of trusting the file.

use super::Ledger;
use crate::block::Block;
use crate::error::SnapshotError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub chain: Vec<Block>,
    pub revoked_keys: Vec<String>,
}

impl LedgerSnapshot {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Ledger {
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            chain: self.chain.clone(),
            revoked_keys: self.revoked_keys(),
        }
    }

    /// Rebuild a ledger from a snapshot, with an empty pending pool.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Result<Self, SnapshotError> {
        let genesis = snapshot.chain.first().ok_or(SnapshotError::Empty)?;
        if *genesis != Block::genesis() {
            return Err(SnapshotError::GenesisMismatch);
        }

        for (position, block) in snapshot.chain.iter().enumerate() {
            let position = position as u64;
            if block.header.index != position {
                return Err(SnapshotError::IndexGap {
                    position,
                    index: block.header.index,
                });
            }
        }

        let ledger = Ledger {
            chain: snapshot.chain,
            pending: Vec::new(),
            revoked: snapshot.revoked_keys.into_iter().collect::<HashSet<_>>(),
        };
        ledger.validate_chain()?;

        log::info!(
            "Ledger restored from snapshot: {} block(s), {} revoked key(s)",
            ledger.chain.len(),
            ledger.revoked.len()
        );
        Ok(ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::WalletKeypair;
    use crate::transaction::Transaction;

    fn populated() -> Ledger {
        let keypair = WalletKeypair::new();
        let mut ledger = Ledger::new();
        ledger.add_transaction(Transaction::sign(&keypair, "Wool", "Sheared", 1));
        ledger.mine_pending_transactions();
        ledger.add_transaction(Transaction::sign(&keypair, "Wool", "Spun", 2));
        ledger.revoke_key("02deadbeef");
        ledger
    }

    #[test]
    fn restores_chain_and_revocations_without_pool() {
        let ledger = populated();
        let json = ledger.snapshot().to_json().unwrap();
        let restored = Ledger::from_snapshot(LedgerSnapshot::from_json(&json).unwrap()).unwrap();

        assert_eq!(restored.chain(), ledger.chain());
        assert_eq!(restored.revoked_keys(), vec!["02deadbeef".to_string()]);
        assert!(restored.pending().is_empty());
        assert!(restored.is_revoked("02deadbeef"));
    }

    #[test]
    fn rejects_empty_and_foreign_genesis() {
        let mut snapshot = populated().snapshot();
        snapshot.chain.clear();
        assert!(matches!(
            Ledger::from_snapshot(snapshot),
            Err(SnapshotError::Empty)
        ));

        let mut snapshot = populated().snapshot();
        snapshot.chain[0].header.timestamp += 1;
        assert!(matches!(
            Ledger::from_snapshot(snapshot),
            Err(SnapshotError::GenesisMismatch)
        ));
    }

    #[test]
    fn rejects_tampered_or_gapped_chain() {
        let mut snapshot = populated().snapshot();
        snapshot.chain[1].transactions[0].details = "Dyed".to_string();
        match Ledger::from_snapshot(snapshot) {
            Err(SnapshotError::Invalid(err)) => assert_eq!(err.check(), "txid_mismatch"),
            other => panic!("unexpected result: {:?}", other.map(|l| l.len())),
        }

        let mut snapshot = populated().snapshot();
        snapshot.chain[1].header.index = 5;
        assert!(matches!(
            Ledger::from_snapshot(snapshot),
            Err(SnapshotError::IndexGap { position: 1, index: 5 })
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            LedgerSnapshot::from_json("{\"chain\": 3}"),
            Err(SnapshotError::Json(_))
        ));
    }
}
