pub mod server;
pub mod service;

pub use server::{run_server, serve_until};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tracechain_core::{Ledger, LedgerSnapshot};

/// Maximum accepted size of a request body (bytes).
pub const MAX_BODY_BYTES: u64 = 64 * 1024;

/// Everything the node owns. There is exactly one per process.
pub struct NodeState {
    pub ledger: Ledger,
    pub node_start_time: std::time::Instant,
}

// Every ledger mutation happens under this one lock, so mining never races
// a submission and block indices stay contiguous.
pub type NodeHandle = Arc<Mutex<NodeState>>;

impl NodeState {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger,
            node_start_time: std::time::Instant::now(),
        }
    }

    pub fn into_handle(self) -> NodeHandle {
        Arc::new(Mutex::new(self))
    }
}

impl Default for NodeState {
    fn default() -> Self {
        Self::new(Ledger::new())
    }
}

/// Load a ledger from `path` if the file exists, otherwise start from genesis.
pub fn load_ledger(path: &Path) -> Result<Ledger> {
    if !path.exists() {
        log::info!("No snapshot at {}, starting from genesis", path.display());
        return Ok(Ledger::new());
    }

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("couldn't read snapshot {}", path.display()))?;
    let snapshot = LedgerSnapshot::from_json(&json)
        .with_context(|| format!("couldn't parse snapshot {}", path.display()))?;
    Ledger::from_snapshot(snapshot)
        .with_context(|| format!("snapshot {} failed validation", path.display()))
}

/// Write the current chain and revocations to `path`.
pub fn save_ledger(ledger: &Ledger, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("couldn't create {}", parent.display()))?;
    }
    let json = ledger.snapshot().to_json()?;
    std::fs::write(path, json).with_context(|| format!("couldn't write {}", path.display()))?;
    log::info!(
        "Snapshot written to {} ({} blocks)",
        path.display(),
        ledger.len()
    );
    Ok(())
}
