use crate::crypto::{WalletKeypair, hash_hex, verify_signature};
use anyhow::Result;
use bincode::{Decode, Encode, config};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

pub static BINCODE_CONFIG: Lazy<config::Configuration> = Lazy::new(|| config::standard());

/// Text that is both signed and hashed into the transaction id.
///
/// Fields are joined with `:` and nothing is escaped, so a product name or
/// details text containing `:` can produce the same message as a different
/// split of the same characters.
pub fn signing_message(product_name: &str, details: &str, timestamp: i64) -> String {
    format!("{}:{}:{}", product_name, details, timestamp)
}

/// Content-derived transaction id: `hash(product_name:details:timestamp)`
pub fn derive_id(product_name: &str, details: &str, timestamp: i64) -> String {
    hash_hex(signing_message(product_name, details, timestamp).as_bytes())
}

/// Provenance record: one signed statement about a product
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: String, // hex, see derive_id
    pub product_name: String,
    pub details: String,
    pub timestamp: i64,            // unix millis
    pub signer_public_key: String, // hex of compressed secp256k1 key
    pub signature: String,         // hex of compact signature (64 bytes)
}

impl Transaction {
    /// Build a record from already-signed parts; the id is derived here.
    pub fn new(
        product_name: &str,
        details: &str,
        timestamp: i64,
        signer_public_key: &str,
        signature: &str,
    ) -> Self {
        Transaction {
            id: derive_id(product_name, details, timestamp),
            product_name: product_name.to_string(),
            details: details.to_string(),
            timestamp,
            signer_public_key: signer_public_key.to_string(),
            signature: signature.to_string(),
        }
    }

    /// Sign a record with `keypair` at the given timestamp.
    pub fn sign(keypair: &WalletKeypair, product_name: &str, details: &str, timestamp: i64) -> Self {
        let message = signing_message(product_name, details, timestamp);
        let sig_hex = hex::encode(keypair.sign(message.as_bytes()));
        Self::new(
            product_name,
            details,
            timestamp,
            &keypair.public_hex(),
            &sig_hex,
        )
    }

    /// Sign a record stamped with the current time.
    pub fn sign_now(keypair: &WalletKeypair, product_name: &str, details: &str) -> Self {
        let timestamp = chrono::Utc::now().timestamp_millis();
        Self::sign(keypair, product_name, details, timestamp)
    }

    pub fn signing_message(&self) -> String {
        signing_message(&self.product_name, &self.details, self.timestamp)
    }

    pub fn compute_id(&self) -> String {
        derive_id(&self.product_name, &self.details, self.timestamp)
    }

    /// The stored id matches the content it claims to identify.
    pub fn has_valid_id(&self) -> bool {
        self.compute_id() == self.id
    }

    /// Verify the signature against `signer_public_key`.
    ///
    /// Errors only when the signature is not hex at all.
    pub fn verify_signature(&self) -> Result<bool> {
        let sig_bytes = hex::decode(&self.signature)?;
        Ok(verify_signature(
            &self.signer_public_key,
            self.signing_message().as_bytes(),
            &sig_bytes,
        ))
    }

    /// Wire encoding used by `POST /tx`.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::encode_to_vec(self, *BINCODE_CONFIG)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (tx, _) = bincode::decode_from_slice::<Transaction, _>(bytes, *BINCODE_CONFIG)?;
        Ok(tx)
    }
}
