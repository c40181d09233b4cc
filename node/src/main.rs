use anyhow::Result;
use tracechain_config::Config;
use tracechain_node::server::serve_until;
use tracechain_node::{NodeState, load_ledger, save_ledger};

#[tokio::main]
async fn main() {
    println!("🚀 Tracechain node starting...");

    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(e) = run().await {
        log::error!("Node stopped: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cfg = Config::load()?;
    let addr = cfg.bind_socket_addr()?;
    let snapshot_path = cfg.snapshot_path_resolved();

    let ledger = match &snapshot_path {
        Some(path) => load_ledger(path)?,
        None => tracechain_core::Ledger::new(),
    };
    log::info!(
        "Ledger ready: {} block(s), {} revoked key(s)",
        ledger.len(),
        ledger.revoked_keys().len()
    );

    let node_handle = NodeState::new(ledger).into_handle();

    let served = serve_until(node_handle.clone(), addr, tokio::signal::ctrl_c()).await;
    if served.is_ok() {
        println!("\n🛑 Shutting down...");
    }

    // persist whatever was accepted, even if the server died
    if let Some(path) = snapshot_path {
        let state = node_handle.lock();
        save_ledger(&state.ledger, &path)?;
    }

    served
}
