//! Ask command: route a request through the supervisor.

use advisor_config::AppConfig;
use advisor_core::types::TradeRequest;
use advisor_dispatch::DispatchRequest;
use anyhow::Result;
use serde_json::Value;

use crate::cli::{print_json, AppContext, AskArgs};

pub async fn run(args: AskArgs, config: AppConfig) -> Result<()> {
    let trade = match (args.ticker, args.side, args.quantity) {
        (Some(ticker), Some(side), Some(quantity)) => Some(TradeRequest {
            ticker,
            side,
            quantity,
            price: args.price,
        }),
        _ => None,
    };

    let ctx = AppContext::new(config);
    let supervisor = ctx.supervisor()?;

    let outcome = supervisor
        .dispatch(DispatchRequest {
            request: args.request,
            thread_id: args.thread,
            portfolio_id: args.portfolio,
            trade,
            params: Value::Null,
        })
        .await?;

    print_json(&outcome)
}
