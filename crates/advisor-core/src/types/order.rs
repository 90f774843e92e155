//! Trade requests and proposals.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProposalError;

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            other => Err(format!("unknown side: {other}")),
        }
    }
}

/// How the order is priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    /// Priced at the resolved market price
    Market,
    /// Priced at a caller-supplied price
    Limit,
}

impl std::fmt::Display for OrderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderKind::Market => write!(f, "market"),
            OrderKind::Limit => write!(f, "limit"),
        }
    }
}

/// Lifecycle status of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Pending,
    Approved,
    Rejected,
    Executed,
}

/// A requested trade, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub ticker: String,
    pub side: Side,
    pub quantity: Decimal,
    /// Absent or zero means "resolve the market price"
    #[serde(default)]
    pub price: Option<Decimal>,
}

impl TradeRequest {
    /// Request priced at market.
    pub fn market(ticker: impl Into<String>, side: Side, quantity: Decimal) -> Self {
        Self {
            ticker: ticker.into(),
            side,
            quantity,
            price: None,
        }
    }

    /// Request priced at the given price.
    pub fn limit(ticker: impl Into<String>, side: Side, quantity: Decimal, price: Decimal) -> Self {
        Self {
            ticker: ticker.into(),
            side,
            quantity,
            price: Some(price),
        }
    }

    /// Whether the market price must be looked up.
    pub fn needs_price(&self) -> bool {
        self.price.map_or(true, |p| p == Decimal::ZERO)
    }
}

/// Fields a reviewer may change on a pending proposal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProposalModifications {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
}

impl ProposalModifications {
    /// Names of the fields a reviewer may modify.
    pub const FIELDS: [&'static str; 3] = ["quantity", "price", "side"];

    /// Check whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.quantity.is_none() && self.price.is_none() && self.side.is_none()
    }
}

/// A normalized, not-yet-committed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeProposal {
    /// Unique proposal ID
    pub id: Uuid,
    pub ticker: String,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Decimal,
    pub order_kind: OrderKind,
    /// quantity * price
    pub total_amount: Decimal,
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
    /// Proposal this one replaced through an edit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supersedes: Option<Uuid>,
}

impl TradeProposal {
    /// Create a pending proposal.
    ///
    /// Fails with [`ProposalError::AmountOverflow`] when `quantity * price`
    /// does not fit a decimal.
    pub fn new(
        ticker: impl Into<String>,
        side: Side,
        quantity: Decimal,
        price: Decimal,
        order_kind: OrderKind,
    ) -> Result<Self, ProposalError> {
        let total_amount = quantity
            .checked_mul(price)
            .ok_or(ProposalError::AmountOverflow { quantity, price })?;

        Ok(Self {
            id: Uuid::new_v4(),
            ticker: ticker.into(),
            side,
            quantity,
            price,
            order_kind,
            total_amount,
            status: ProposalStatus::Pending,
            created_at: Utc::now(),
            supersedes: None,
        })
    }

    /// Copy of this proposal with a new status.
    ///
    /// Proposals are never mutated once they leave `Pending`; status changes
    /// produce a new value recorded alongside the old one.
    pub fn with_status(&self, status: ProposalStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    /// Check if the proposal is still awaiting a decision.
    pub fn is_pending(&self) -> bool {
        self.status == ProposalStatus::Pending
    }
}
