mod commands;
mod keyfile;

use clap::Parser;
use commands::*;

#[derive(Parser)]
#[command(name = "tracechain")]
#[command(about = "Tracechain provenance ledger CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Keygen { force } => generate_key(force),
        Commands::Submit { product, details } => submit_record(&product, &details),
        Commands::Mine => mine_block(),
        Commands::Revoke { public_key } => revoke_key(public_key),
        Commands::Chain => show_chain(),
        Commands::Mempool => show_mempool(),
        Commands::Revoked => show_revoked(),
        Commands::Validate => validate_chain(),
        Commands::Proof { block, tx_id } => fetch_and_verify_proof(block, &tx_id),
        Commands::Config { subcommand } => match subcommand {
            ConfigCommands::View => config_view(),
            ConfigCommands::Set { key, value } => config_set(&key, &value),
            ConfigCommands::Init => config_init(),
        },
    };

    if let Err(e) = result {
        println!("❌ {:#}", e);
        std::process::exit(1);
    }
}
