use crate::config::{MAX_DETAILS_LEN, MAX_FUTURE_TIMESTAMP_MS, MAX_PRODUCT_NAME_LEN};
use crate::transaction::Transaction;
/// Checks a submitting layer runs before handing a transaction to the ledger.
/// The ledger itself only enforces revocation.
use anyhow::{Result, anyhow};

/// Validate a submitted transaction against `now_ms` (unix millis)
pub fn validate_submission(tx: &Transaction, now_ms: i64) -> Result<()> {
    // 1. Field sizes
    if tx.product_name.trim().is_empty() {
        return Err(anyhow!("product name is empty"));
    }

    if tx.product_name.len() > MAX_PRODUCT_NAME_LEN {
        return Err(anyhow!(
            "product name too long: {} bytes (max {})",
            tx.product_name.len(),
            MAX_PRODUCT_NAME_LEN
        ));
    }

    if tx.details.len() > MAX_DETAILS_LEN {
        return Err(anyhow!(
            "details too long: {} bytes (max {})",
            tx.details.len(),
            MAX_DETAILS_LEN
        ));
    }

    // 2. Timestamp must not be ahead of the node clock beyond drift tolerance
    if tx.timestamp > now_ms + MAX_FUTURE_TIMESTAMP_MS {
        return Err(anyhow!(
            "transaction timestamp too far in future: {} > {}",
            tx.timestamp,
            now_ms + MAX_FUTURE_TIMESTAMP_MS
        ));
    }

    // 3. Id must be the content hash
    if !tx.has_valid_id() {
        return Err(anyhow!(
            "transaction id {} does not match its content (expected {})",
            tx.id,
            tx.compute_id()
        ));
    }

    // 4. Signature
    match tx.verify_signature() {
        Ok(true) => Ok(()),
        Ok(false) => Err(anyhow!("tx signature invalid: {}", tx.id)),
        Err(e) => Err(anyhow!("tx signature malformed: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::WalletKeypair;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn accepts_signed_record() {
        let keypair = WalletKeypair::new();
        let tx = Transaction::sign(&keypair, "Salmon", "Caught off Lofoten", NOW);
        assert!(validate_submission(&tx, NOW).is_ok());
    }

    #[test]
    fn rejects_bad_fields() {
        let keypair = WalletKeypair::new();

        let tx = Transaction::sign(&keypair, "  ", "details", NOW);
        assert!(validate_submission(&tx, NOW).is_err());

        let tx = Transaction::sign(&keypair, &"p".repeat(MAX_PRODUCT_NAME_LEN + 1), "d", NOW);
        let err = validate_submission(&tx, NOW).unwrap_err();
        assert!(err.to_string().contains("too long"));

        let tx = Transaction::sign(&keypair, "Salmon", &"d".repeat(MAX_DETAILS_LEN + 1), NOW);
        assert!(validate_submission(&tx, NOW).is_err());
    }

    #[test]
    fn rejects_future_timestamp() {
        let keypair = WalletKeypair::new();
        let tx = Transaction::sign(&keypair, "Salmon", "Frozen", NOW + MAX_FUTURE_TIMESTAMP_MS + 1);
        let err = validate_submission(&tx, NOW).unwrap_err();
        assert!(err.to_string().contains("future"));
    }

    #[test]
    fn rejects_forged_id_or_signature() {
        let keypair = WalletKeypair::new();
        let tx = Transaction::sign(&keypair, "Salmon", "Smoked", NOW);

        let mut wrong_id = tx.clone();
        wrong_id.id = "00".repeat(32);
        assert!(validate_submission(&wrong_id, NOW).is_err());

        // content and id agree, but the signature was made for other content
        let mut edited = tx.clone();
        edited.details = "Canned".to_string();
        edited.id = edited.compute_id();
        let err = validate_submission(&edited, NOW).unwrap_err();
        assert!(err.to_string().contains("signature invalid"));

        let mut other_signer = tx.clone();
        other_signer.signer_public_key = WalletKeypair::new().public_hex();
        assert!(validate_submission(&other_signer, NOW).is_err());

        let mut garbage = tx;
        garbage.signature = "xyz".to_string();
        assert!(validate_submission(&garbage, NOW).is_err());
    }
}
