//! Terminal records of a workflow: executions and cancellations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Side, TradeProposal};

/// Status of a committed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Filled,
}

/// Record of a committed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub order_id: Uuid,
    pub proposal_id: Uuid,
    pub ticker: String,
    pub side: Side,
    pub status: ExecutionStatus,
    pub filled_price: Decimal,
    pub filled_quantity: Decimal,
    pub total: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl ExecutionResult {
    /// Build a full fill of the given proposal.
    pub fn filled(proposal: &TradeProposal) -> Self {
        Self {
            order_id: Uuid::new_v4(),
            proposal_id: proposal.id,
            ticker: proposal.ticker.clone(),
            side: proposal.side,
            status: ExecutionStatus::Filled,
            filled_price: proposal.price,
            filled_quantity: proposal.quantity,
            total: proposal.total_amount,
            timestamp: Utc::now(),
        }
    }
}

/// Record of a rejected proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancellationRecord {
    pub thread_id: String,
    pub proposal_id: Uuid,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub timestamp: DateTime<Utc>,
}
