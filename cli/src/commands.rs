use crate::keyfile::{load_keypair, save_keypair};
use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracechain_config::Config;
use tracechain_core::merkle::{self, ProofStep};
use tracechain_core::security::validate_submission;
use tracechain_core::{Block, Transaction, WalletKeypair};

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new signing key and store it at the configured key path
    Keygen {
        /// Overwrite an existing key file
        #[arg(long)]
        force: bool,
    },

    /// Sign a provenance record and submit it to the node
    Submit {
        #[arg(long)]
        product: String,
        #[arg(long)]
        details: String,
    },

    /// Ask the node to mine the pending pool into a new block
    Mine,

    /// Revoke a signer key (defaults to the local key)
    Revoke { public_key: Option<String> },

    /// Print the chain
    Chain,

    /// Print the pending pool
    Mempool,

    /// Print revoked signer keys
    Revoked,

    /// Ask the node to re-check every block
    Validate,

    /// Fetch an inclusion proof and verify it locally
    Proof { block: u64, tx_id: String },

    /// Manage CLI configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
pub enum ConfigCommands {
    View,
    Set { key: String, value: String },
    Init,
}

struct NodeClient {
    base_url: String,
    client: Client,
}

impl NodeClient {
    fn from_config(cfg: &Config) -> Self {
        Self {
            base_url: cfg.node_rpc_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        log::debug!("GET {}", url);
        let res = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("request to {} failed", url))?;
        let status = res.status();
        if !status.is_success() {
            let body: Value = res.json().unwrap_or(Value::Null);
            return Err(anyhow!("node returned {}: {}", status, body));
        }
        res.json().with_context(|| format!("invalid response from {}", url))
    }

    fn post_json(&self, path: &str, body: &Value) -> Result<(reqwest::StatusCode, Value)> {
        let url = self.url(path);
        log::debug!("POST {}", url);
        let res = self
            .client
            .post(&url)
            .json(body)
            .send()
            .with_context(|| format!("request to {} failed", url))?;
        let status = res.status();
        let json = res.json().unwrap_or(Value::Null);
        Ok((status, json))
    }

    fn post_bytes(&self, path: &str, body: Vec<u8>) -> Result<(reqwest::StatusCode, Value)> {
        let url = self.url(path);
        log::debug!("POST {} ({} bytes)", url, body.len());
        let res = self
            .client
            .post(&url)
            .body(body)
            .header("Content-Type", "application/octet-stream")
            .send()
            .with_context(|| format!("request to {} failed", url))?;
        let status = res.status();
        let json = res.json().unwrap_or(Value::Null);
        Ok((status, json))
    }
}

pub fn generate_key(force: bool) -> Result<()> {
    let cfg = Config::load()?;
    let path = cfg.key_path_resolved();
    if path.exists() && !force {
        return Err(anyhow!(
            "key file {} already exists (use --force to replace it)",
            path.display()
        ));
    }

    let keypair = WalletKeypair::new();
    save_keypair(&keypair, &path)?;

    println!("✅ New signing key created successfully!");
    println!("📋 Public Key: {}", keypair.public_hex());
    println!("💾 Saved to: {}", path.display());
    println!();
    println!("⚠️  IMPORTANT: Keep the key file private, anyone holding it can sign as you.");
    Ok(())
}

pub fn submit_record(product: &str, details: &str) -> Result<()> {
    let cfg = Config::load()?;
    let keypair = load_keypair(&cfg.key_path_resolved())?;

    let tx = Transaction::sign_now(&keypair, product, details);
    validate_submission(&tx, chrono::Utc::now().timestamp_millis())?;

    println!("✅ Record signed");
    println!("   ID: {}", tx.id);
    println!("   Product: {}", tx.product_name);
    println!("   Signer: {}", tx.signer_public_key);

    let client = NodeClient::from_config(&cfg);
    let (status, body) = client.post_bytes("/tx", tx.encode()?)?;
    if status.is_success() {
        match body["status"].as_str() {
            Some("duplicate") => println!("ℹ️  Node already has this record"),
            _ => println!("🚀 Record queued for the next block!"),
        }
        Ok(())
    } else {
        Err(anyhow!(
            "submission rejected ({}): {}",
            status,
            body["message"].as_str().unwrap_or("no message")
        ))
    }
}

pub fn mine_block() -> Result<()> {
    let cfg = Config::load()?;
    let client = NodeClient::from_config(&cfg);
    let (status, body) = client.post_json("/mine", &Value::Null)?;
    if !status.is_success() {
        return Err(anyhow!("mining failed ({}): {}", status, body));
    }

    println!("⛏️  Mined block #{}", body["index"]);
    println!("   Hash: {}", body["hash"].as_str().unwrap_or("?"));
    println!("   Merkle root: {}", body["merkle_root"].as_str().unwrap_or("?"));
    println!("   Transactions: {}", body["transactions"]);
    Ok(())
}

pub fn revoke_key(public_key: Option<String>) -> Result<()> {
    let cfg = Config::load()?;
    let public_key = match public_key {
        Some(pk) => pk,
        None => load_keypair(&cfg.key_path_resolved())?.public_hex(),
    };

    let client = NodeClient::from_config(&cfg);
    let (status, body) =
        client.post_json("/revoke", &serde_json::json!({ "public_key": public_key }))?;
    if !status.is_success() {
        return Err(anyhow!(
            "revocation failed ({}): {}",
            status,
            body["message"].as_str().unwrap_or("no message")
        ));
    }

    if body["newly_revoked"].as_bool().unwrap_or(false) {
        println!("🚫 Revoked {}", public_key);
    } else {
        println!("ℹ️  {} was already revoked", public_key);
    }
    Ok(())
}

fn print_transaction(tx: &Transaction) {
    let when = chrono::DateTime::from_timestamp_millis(tx.timestamp)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| tx.timestamp.to_string());
    println!("   • {} [{}]", tx.product_name, when);
    println!("     {}", tx.details);
    println!("     id={} signer={}", tx.id, tx.signer_public_key);
}

pub fn show_chain() -> Result<()> {
    let cfg = Config::load()?;
    let client = NodeClient::from_config(&cfg);
    let body: Value = client.get("/chain")?;
    let blocks: Vec<Block> =
        serde_json::from_value(body["blocks"].clone()).context("invalid chain response")?;

    println!("⛓️  {} block(s)", blocks.len());
    for block in &blocks {
        println!();
        println!("📦 Block #{}", block.header.index);
        println!("   Hash: {}", block.hash);
        println!("   Previous: {}", block.header.previous_hash);
        println!("   Merkle root: {}", block.header.merkle_root);
        println!("   Nonce: {}", block.header.nonce);
        for tx in &block.transactions {
            print_transaction(tx);
        }
    }
    Ok(())
}

pub fn show_mempool() -> Result<()> {
    let cfg = Config::load()?;
    let client = NodeClient::from_config(&cfg);
    let body: Value = client.get("/mempool")?;
    let txs: Vec<Transaction> = serde_json::from_value(body["transactions"].clone())
        .context("invalid mempool response")?;

    println!("⏳ {} pending record(s)", txs.len());
    for tx in &txs {
        print_transaction(tx);
    }
    Ok(())
}

pub fn show_revoked() -> Result<()> {
    let cfg = Config::load()?;
    let client = NodeClient::from_config(&cfg);
    let body: Value = client.get("/revoked")?;
    let keys: Vec<String> = serde_json::from_value(body["revoked_keys"].clone())
        .context("invalid revoked response")?;

    println!("🚫 {} revoked key(s)", keys.len());
    for key in keys {
        println!("   {}", key);
    }
    Ok(())
}

pub fn validate_chain() -> Result<()> {
    let cfg = Config::load()?;
    let client = NodeClient::from_config(&cfg);
    let report: Value = client.get("/chain/validate")?;

    if report["valid"].as_bool().unwrap_or(false) {
        println!("✅ Chain is valid ({} blocks)", report["height"]);
    } else {
        let failure = &report["failure"];
        println!(
            "❌ Chain is INVALID at block {} [{}]",
            failure["index"],
            failure["check"].as_str().unwrap_or("?")
        );
        println!("   {}", failure["message"].as_str().unwrap_or(""));
    }
    Ok(())
}

/// Fold `proof` from `tx_id` and compare with `merkle_root`, without trusting the node.
pub fn check_proof(tx_id: &str, proof: &[ProofStep], merkle_root: &str) -> bool {
    !proof.is_empty() && merkle::verify_proof(tx_id, proof, merkle_root)
}

pub fn fetch_and_verify_proof(block: u64, tx_id: &str) -> Result<()> {
    let cfg = Config::load()?;
    let client = NodeClient::from_config(&cfg);
    let body: Value = client.get(&format!("/block/{}/proof/{}", block, tx_id))?;

    let merkle_root = body["merkle_root"]
        .as_str()
        .ok_or_else(|| anyhow!("proof response has no merkle_root"))?
        .to_string();
    let proof: Vec<ProofStep> =
        serde_json::from_value(body["proof"].clone()).context("invalid proof response")?;

    if !body["found"].as_bool().unwrap_or(false) {
        println!("❌ Transaction {} is not in block #{}", tx_id, block);
        return Ok(());
    }

    println!("🔎 Proof for {} in block #{}", tx_id, block);
    for (level, step) in proof.iter().enumerate() {
        println!("   {:>2}: {:?} {}", level, step.position, step.hash);
    }

    if check_proof(tx_id, &proof, &merkle_root) {
        println!("✅ Verified locally against root {}", merkle_root);
    } else {
        println!("❌ Proof does NOT reach root {}", merkle_root);
    }
    Ok(())
}

pub fn config_view() -> Result<()> {
    let cfg = Config::load()?;
    println!("{}", cfg.to_pretty_json()?);
    Ok(())
}

pub fn config_set(key: &str, value: &str) -> Result<()> {
    let mut cfg = Config::load()?;
    cfg.set_value(key, value)?;
    let path = cfg.save()?;
    println!("✅ {} updated in {}", key, path.display());
    Ok(())
}

pub fn config_init() -> Result<()> {
    let path = Config::init_default()?;
    println!("✅ Default configuration written to {}", path.display());
    Ok(())
}
