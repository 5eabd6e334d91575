use std::path::{Path, PathBuf};

use cexarb::app::Config;
use clap::{Parser, Subcommand};
use tracing::info;

/// Centralized exchange / on-chain order book arbitrage engine
#[derive(Parser, Debug)]
#[command(name = "cexarb")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a configuration file and list the pairs it registers
    Check {
        /// Path to the TOML configuration
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
    },
}

fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config } => {
            if let Err(e) = check(&config) {
                eprintln!("Configuration invalid: {e}");
                std::process::exit(1);
            }
        }
    }
}

fn check(path: &Path) -> cexarb::error::Result<()> {
    let config = Config::load(path)?;
    config.init_logging();
    let pairs = config.trading_pairs()?;
    info!(path = %path.display(), pairs = pairs.len(), "Configuration loaded");

    println!("{} pair(s) registered", pairs.len());
    for pair in &pairs {
        println!(
            "  {:<12} venue={:<12} base={} quote={}",
            pair.to_string(),
            pair.venue_symbol(),
            pair.base().denom(),
            pair.quote().denom()
        );
    }
    Ok(())
}
