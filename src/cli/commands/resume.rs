//! Resume command: approve, reject or edit a suspended proposal.

use advisor_config::AppConfig;
use advisor_core::types::{Decision, ProposalModifications, ResumeCommand};
use anyhow::{bail, Result};

use crate::cli::{print_json, AppContext, DecisionArg, ResumeArgs};

pub async fn run(args: ResumeArgs, config: AppConfig) -> Result<()> {
    let modifications = ProposalModifications {
        quantity: args.quantity,
        price: args.price,
        side: args.side,
    };

    let decision = match args.decision {
        DecisionArg::Approve => Decision::Approved,
        DecisionArg::Reject => Decision::Rejected,
        DecisionArg::Edit => Decision::Edit,
    };

    if decision == Decision::Rejected && !modifications.is_empty() {
        bail!("--quantity, --price and --side only apply to approve or edit");
    }

    let command = ResumeCommand {
        decision,
        modifications: (!modifications.is_empty()).then_some(modifications),
        notes: args.notes,
    };

    let ctx = AppContext::new(config);
    let outcome = ctx.gate.resume(&args.thread, command).await?;
    print_json(&outcome)
}
