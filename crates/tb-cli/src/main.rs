use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tb_portfolio::Side;

mod commands;
mod load;

use commands::{portfolio, Settings};

#[derive(Parser)]
#[command(name = "tb")]
#[command(about = "Tradebook portfolio engine CLI", long_about = None)]
struct Cli {
    /// Layered config paths in merge order (base -> overrides)
    #[arg(long = "config", global = true)]
    config_paths: Vec<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Value open positions at the given prices and print the snapshot (JSON)
    Snapshot {
        /// Trade log (.csv or .json)
        #[arg(long)]
        trades: PathBuf,

        /// Price file (.csv `symbol,price` or .json object)
        #[arg(long)]
        prices: PathBuf,
    },

    /// Print cumulative realized gain over the full trade log
    Realized {
        /// Trade log (.csv or .json)
        #[arg(long)]
        trades: PathBuf,

        /// Also print one line per symbol
        #[arg(long, default_value_t = false)]
        by_symbol: bool,
    },

    /// Check a prospective trade against the current positions
    Validate {
        /// Trade log (.csv or .json)
        #[arg(long)]
        trades: PathBuf,

        #[arg(long)]
        symbol: String,

        /// buy | sell
        #[arg(long, value_parser = parse_side)]
        side: Side,

        /// Decimal price, e.g. 150.25
        #[arg(long)]
        price: String,

        /// Decimal quantity, e.g. 0.5
        #[arg(long)]
        qty: String,

        /// Trade time (RFC 3339 or YYYY-MM-DD); defaults to now
        #[arg(long)]
        at: Option<String>,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

fn parse_side(s: &str) -> Result<Side, String> {
    s.parse::<Side>().map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    // Load .env.local if present (dev convenience). Silent if missing.
    let _ = dotenvy::from_filename(".env.local");

    let cli = Cli::parse();

    let settings = Settings::load(&cli.config_paths)?;
    init_tracing(&settings.engine.logging.filter);
    settings.warn_unused_keys()?;

    let calc = settings.engine.calculator();

    match cli.cmd {
        Commands::Snapshot { trades, prices } => portfolio::snapshot(&calc, &trades, &prices)?,

        Commands::Realized { trades, by_symbol } => portfolio::realized(&trades, by_symbol)?,

        Commands::Validate {
            trades,
            symbol,
            side,
            price,
            qty,
            at,
        } => portfolio::validate(
            &calc,
            &trades,
            portfolio::ProspectiveTrade {
                symbol: &symbol,
                side,
                price: &price,
                quantity: &qty,
                at: at.as_deref(),
            },
        )?,

        Commands::ConfigHash { paths } => commands::config_hash(&paths)?,
    }

    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG` wins over
/// the configured filter.
fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}
