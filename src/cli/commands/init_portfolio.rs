//! Portfolio initialization command.

use advisor_config::AppConfig;
use advisor_core::traits::PortfolioLedger;
use advisor_core::types::Portfolio;
use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use tracing::info;

use crate::cli::{print_json, AppContext, InitPortfolioArgs};

pub async fn run(args: InitPortfolioArgs, config: AppConfig) -> Result<()> {
    if args.cash < Decimal::ZERO {
        bail!("Cash balance must not be negative: {}", args.cash);
    }

    let ctx = AppContext::new(config);
    let portfolio = args
        .positions
        .into_iter()
        .fold(Portfolio::new(&args.id, &args.owner, args.cash), Portfolio::with_position);

    let stored = ctx
        .ledger
        .upsert(portfolio)
        .await
        .with_context(|| format!("Failed to store portfolio {}", args.id))?;

    info!(
        portfolio_id = %stored.id,
        version = stored.version,
        ledger = %ctx.ledger.path().display(),
        "Portfolio stored"
    );
    print_json(&stored.view())
}
