//! Hash and signature boundary.
//!
//! Everything else in the crate hashes through [`hash_hex`] and treats keys and
//! signatures as opaque hex strings. Only this module knows they are SHA-256
//! digests and secp256k1 ECDSA signatures.

use anyhow::{Result, anyhow};
use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};

/// SHA-256 of `data`, lowercase hex (64 chars).
pub fn hash_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn digest_message(message: &[u8]) -> Message {
    let digest: [u8; 32] = Sha256::digest(message).into();
    Message::from_digest(digest)
}

/// Signing identity of a record submitter.
#[derive(Debug, Clone)]
pub struct WalletKeypair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl WalletKeypair {
    /// Generate a fresh random keypair.
    pub fn new() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut secp256k1::rand::thread_rng());
        WalletKeypair {
            secret_key,
            public_key,
        }
    }

    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        WalletKeypair {
            secret_key,
            public_key,
        }
    }

    /// Restore a keypair from a hex-encoded 32-byte secret.
    pub fn from_hex(secret_hex: &str) -> Result<Self> {
        let bytes = hex::decode(secret_hex.trim())?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|e| anyhow!("invalid secret key: {}", e))?;
        Ok(Self::from_secret_key(secret_key))
    }

    pub fn secret_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Compressed SEC1 public key (33 bytes) as hex.
    pub fn public_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    /// ECDSA over the SHA-256 digest of `message`, compact 64-byte encoding.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        let secp = Secp256k1::signing_only();
        secp.sign_ecdsa(&digest_message(message), &self.secret_key)
            .serialize_compact()
    }
}

impl Default for WalletKeypair {
    fn default() -> Self {
        Self::new()
    }
}

/// Check `signature` (compact, 64 bytes) over `message` against a hex public key.
///
/// Malformed keys or signatures simply fail verification.
pub fn verify_signature(public_hex: &str, message: &[u8], signature: &[u8]) -> bool {
    let Ok(pk_bytes) = hex::decode(public_hex) else {
        return false;
    };
    let Ok(public_key) = PublicKey::from_slice(&pk_bytes) else {
        return false;
    };
    let Ok(sig) = Signature::from_compact(signature) else {
        return false;
    };
    let secp = Secp256k1::verification_only();
    secp.verify_ecdsa(&digest_message(message), &sig, &public_key)
        .is_ok()
}
