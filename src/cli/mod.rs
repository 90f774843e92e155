//! CLI definitions.

pub mod commands;
mod context;

pub use context::AppContext;

use advisor_config::{load_config, AppConfig};
use advisor_core::types::{Position, Side};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG: &str = "config/default.toml";

#[derive(Parser)]
#[command(name = "advisor")]
#[command(author, version, about = "Investment advisory workflow with human approval for trades")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG, env = "ADVISOR_CONFIG")]
    pub config: PathBuf,

    /// Log level (defaults to logging.level from the config)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create or replace a portfolio in the ledger
    InitPortfolio(InitPortfolioArgs),
    /// Propose a trade and suspend it for approval
    Propose(ProposeArgs),
    /// Approve, reject or edit a suspended proposal
    Resume(ResumeArgs),
    /// Show a thread, a portfolio, or all threads
    Status(StatusArgs),
    /// Route a request through the supervisor
    Ask(AskArgs),
    /// Validate configuration and print the effective settings
    ValidateConfig,
}

#[derive(clap::Args)]
pub struct InitPortfolioArgs {
    /// Portfolio ID
    #[arg(long)]
    pub id: String,

    /// Owner reference
    #[arg(long)]
    pub owner: String,

    /// Cash balance
    #[arg(long)]
    pub cash: Decimal,

    /// Position as TICKER:QUANTITY:AVERAGE_PRICE[:SECTOR] (repeatable)
    #[arg(long = "position", value_parser = parse_position)]
    pub positions: Vec<Position>,
}

#[derive(clap::Args)]
pub struct TradeArgs {
    /// Ticker symbol
    #[arg(short, long)]
    pub ticker: String,

    /// buy or sell
    #[arg(short, long)]
    pub side: Side,

    /// Number of shares
    #[arg(short, long)]
    pub quantity: Decimal,

    /// Limit price (omit to use the latest market price)
    #[arg(short, long)]
    pub price: Option<Decimal>,
}

#[derive(clap::Args)]
pub struct ProposeArgs {
    /// Conversation thread ID
    #[arg(long)]
    pub thread: String,

    /// Portfolio to trade in
    #[arg(long)]
    pub portfolio: String,

    #[command(flatten)]
    pub trade: TradeArgs,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DecisionArg {
    Approve,
    Reject,
    Edit,
}

#[derive(clap::Args)]
pub struct ResumeArgs {
    /// Conversation thread ID
    #[arg(long)]
    pub thread: String,

    /// Reviewer decision
    #[arg(short, long)]
    pub decision: DecisionArg,

    /// New quantity (edit)
    #[arg(long)]
    pub quantity: Option<Decimal>,

    /// New price, 0 for market (edit)
    #[arg(long)]
    pub price: Option<Decimal>,

    /// New side (edit)
    #[arg(long)]
    pub side: Option<Side>,

    /// Reviewer notes; the rejection reason when rejecting
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args)]
pub struct StatusArgs {
    /// Thread to show
    #[arg(long)]
    pub thread: Option<String>,

    /// Portfolio to show
    #[arg(long)]
    pub portfolio: Option<String>,
}

#[derive(clap::Args)]
pub struct AskArgs {
    /// Request text
    pub request: String,

    /// Conversation thread ID (needed when a trade goes to approval)
    #[arg(long)]
    pub thread: Option<String>,

    /// Portfolio the request is about
    #[arg(long)]
    pub portfolio: Option<String>,

    /// Ticker of an already extracted trade
    #[arg(long, requires_all = ["side", "quantity"])]
    pub ticker: Option<String>,

    #[arg(long)]
    pub side: Option<Side>,

    #[arg(long)]
    pub quantity: Option<Decimal>,

    #[arg(long)]
    pub price: Option<Decimal>,
}

/// Load the configuration. The default path may be absent; an explicit one
/// must exist.
pub fn load(path: &Path) -> Result<AppConfig> {
    let required = path != Path::new(DEFAULT_CONFIG) || path.exists();
    load_config(path, required)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_position(s: &str) -> Result<Position, String> {
    let parts: Vec<&str> = s.split(':').collect();
    if !(3..=4).contains(&parts.len()) {
        return Err(format!("expected TICKER:QUANTITY:AVERAGE_PRICE[:SECTOR], got {s:?}"));
    }

    let decimal = |field: &str, value: &str| {
        value
            .trim()
            .parse::<Decimal>()
            .map_err(|e| format!("invalid {field} {value:?}: {e}"))
    };
    let quantity = decimal("quantity", parts[1])?;
    let average_price = decimal("average price", parts[2])?;
    if quantity <= Decimal::ZERO || average_price < Decimal::ZERO {
        return Err(format!("position {s:?} needs a positive quantity and non-negative price"));
    }

    let position = Position::new(parts[0].trim().to_ascii_uppercase(), quantity, average_price);
    Ok(match parts.get(3) {
        Some(sector) if !sector.trim().is_empty() => position.with_sector(sector.trim()),
        _ => position,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_position() {
        let p = parse_position("005930:100:70000:Semiconductors").unwrap();
        assert_eq!(p.ticker, "005930");
        assert_eq!(p.quantity, dec!(100));
        assert_eq!(p.sector.as_deref(), Some("Semiconductors"));

        assert!(parse_position("aapl:1:190").unwrap().sector.is_none());
        assert!(parse_position("X:0:1").is_err());
        assert!(parse_position("X:1").is_err());
    }
}
