use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracechain_core::WalletKeypair;

/// On-disk form of a signing key.
#[derive(Serialize, Deserialize)]
struct KeyJson {
    secret_key: String,
    public_key: String,
}

pub fn save_keypair(keypair: &WalletKeypair, path: &Path) -> Result<()> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("couldn't create {}", parent.display()))?;
    }

    let key_json = KeyJson {
        secret_key: keypair.secret_hex(),
        public_key: keypair.public_hex(),
    };
    let data = serde_json::to_string_pretty(&key_json)?;
    fs::write(path, data).with_context(|| format!("couldn't write key file {}", path.display()))
}

/// Load the key at `path`, checking that the stored public key belongs to the secret.
pub fn load_keypair(path: &Path) -> Result<WalletKeypair> {
    let data = fs::read_to_string(path).with_context(|| {
        format!(
            "couldn't read key file {} (run `tracechain keygen` first)",
            path.display()
        )
    })?;
    let key_json: KeyJson = serde_json::from_str(&data)
        .with_context(|| format!("invalid key file {}", path.display()))?;

    let keypair = WalletKeypair::from_hex(&key_json.secret_key)?;
    if keypair.public_hex() != key_json.public_key {
        return Err(anyhow!(
            "key file {} is inconsistent: public key does not match secret key",
            path.display()
        ));
    }
    Ok(keypair)
}
