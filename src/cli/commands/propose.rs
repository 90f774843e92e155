//! Trade proposal command.

use advisor_config::AppConfig;
use advisor_core::types::TradeRequest;
use anyhow::Result;

use crate::cli::{print_json, AppContext, ProposeArgs};

pub async fn run(args: ProposeArgs, config: AppConfig) -> Result<()> {
    let ctx = AppContext::new(config);
    let request = TradeRequest {
        ticker: args.trade.ticker,
        side: args.trade.side,
        quantity: args.trade.quantity,
        price: args.trade.price,
    };

    let payload = ctx.gate.start(&args.thread, &args.portfolio, &request).await?;
    print_json(&payload)
}
