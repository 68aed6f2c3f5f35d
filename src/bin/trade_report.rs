//! Trade Report Binary - Lineage and By-Year Trade Listing
//!
//! Reads the league archive database and prints JSON to stdout.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin trade_report -- trades
//! cargo run --release --bin trade_report -- tree <group_id>
//! ```
//!
//! ## Environment Variables
//!
//! - LEAGUE_DB_PATH - Path to the SQLite archive database (required)
//! - RUST_LOG - Logging level (optional, default: info)

use leaguevault::config::Config;
use leaguevault::lineage_core::{
    LineageError, SqliteTransactionStore, TradeGroupSummarizer, TradeLineageBuilder,
};
use std::env;
use std::sync::Arc;

enum Command {
    Trades,
    Tree(i64),
}

fn parse_command_from_args() -> Option<Command> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("trades") => Some(Command::Trades),
        Some("tree") => args
            .get(2)
            .and_then(|s| s.parse::<i64>().ok())
            .map(Command::Tree),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let Some(command) = parse_command_from_args() else {
        eprintln!("Usage: trade_report trades | trade_report tree <group_id>");
        std::process::exit(2);
    };

    let config = Config::from_env()?;

    log::info!("🚀 Starting trade report");
    log::info!("   Database: {}", config.db_path);

    let store = Arc::new(SqliteTransactionStore::open(&config.db_path)?);

    match command {
        Command::Trades => {
            let summarizer = TradeGroupSummarizer::new(store);
            let by_year = summarizer.list_trades_by_year().await?;

            let trade_count: usize = by_year.values().map(|v| v.len()).sum();
            log::info!("✅ Found {} trades across {} seasons", trade_count, by_year.len());

            println!("{}", serde_json::to_string_pretty(&by_year)?);
        }
        Command::Tree(group_id) => {
            let builder = TradeLineageBuilder::new(store);
            match builder.build_lineage(group_id).await {
                Ok(forest) => {
                    log::info!(
                        "✅ Built lineage for group {}: {} roots",
                        group_id,
                        forest.roots.len()
                    );
                    println!("{}", serde_json::to_string_pretty(&forest)?);
                }
                Err(LineageError::NotFound(id)) => {
                    log::error!("❌ No trade found for transaction group {}", id);
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(())
}
