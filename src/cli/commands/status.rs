//! Status command.

use advisor_config::AppConfig;
use advisor_core::traits::PortfolioLedger;
use anyhow::Result;
use serde_json::json;

use crate::cli::{print_json, AppContext, StatusArgs};

pub async fn run(args: StatusArgs, config: AppConfig) -> Result<()> {
    let ctx = AppContext::new(config);

    if let Some(portfolio_id) = &args.portfolio {
        let portfolio = ctx.ledger.portfolio(portfolio_id).await?;
        print_json(&json!({ "version": portfolio.version, "portfolio": portfolio.view() }))?;
    }

    match &args.thread {
        Some(thread_id) => print_json(&ctx.gate.status(thread_id).await?),
        None if args.portfolio.is_none() => {
            let mut threads = Vec::new();
            for thread_id in ctx.gate.threads().await? {
                let state = ctx.gate.status(&thread_id).await?;
                threads.push(json!({
                    "thread_id": thread_id,
                    "portfolio_id": state.portfolio_id,
                    "stage": state.stage,
                    "revision": state.revision,
                    "updated_at": state.updated_at,
                }));
            }
            print_json(&threads)
        }
        None => Ok(()),
    }
}
