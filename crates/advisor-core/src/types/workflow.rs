//! Approval workflow state: stages, checkpoints and resume commands.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    CancellationRecord, ExecutionResult, OrderKind, Portfolio, PortfolioView,
    ProposalModifications, RiskDelta, RiskSnapshot, Side, TradeProposal,
};
use crate::error::WorkflowError;

/// Stage of a per-thread approval workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    Planning,
    Simulating,
    AwaitingApproval,
    Executing,
    Resimulating,
    Executed,
    Cancelled,
}

impl WorkflowStage {
    /// Check if the workflow can make no further progress.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStage::Executed | WorkflowStage::Cancelled)
    }
}

impl std::fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WorkflowStage::Planning => "planning",
            WorkflowStage::Simulating => "simulating",
            WorkflowStage::AwaitingApproval => "awaiting_approval",
            WorkflowStage::Executing => "executing",
            WorkflowStage::Resimulating => "resimulating",
            WorkflowStage::Executed => "executed",
            WorkflowStage::Cancelled => "cancelled",
        };
        write!(f, "{name}")
    }
}

/// Input that moves a workflow between stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowEvent {
    ProposalBuilt,
    Suspended,
    Approve,
    Edit,
    Reject,
    Resimulate,
    Committed,
    ExecutionFailed,
}

impl std::fmt::Display for WorkflowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WorkflowEvent::ProposalBuilt => "proposal_built",
            WorkflowEvent::Suspended => "suspended",
            WorkflowEvent::Approve => "approve",
            WorkflowEvent::Edit => "edit",
            WorkflowEvent::Reject => "reject",
            WorkflowEvent::Resimulate => "resimulate",
            WorkflowEvent::Committed => "committed",
            WorkflowEvent::ExecutionFailed => "execution_failed",
        };
        write!(f, "{name}")
    }
}

/// The workflow transition function.
///
/// `ExecutionFailed` returns to `AwaitingApproval` so the reviewer can edit or
/// reject a proposal the live portfolio no longer supports.
pub fn transition(from: WorkflowStage, event: WorkflowEvent) -> Result<WorkflowStage, WorkflowError> {
    use WorkflowEvent as E;
    use WorkflowStage as S;

    match (from, event) {
        (S::Planning, E::ProposalBuilt) => Ok(S::Simulating),
        (S::Simulating, E::Suspended) => Ok(S::AwaitingApproval),
        (S::AwaitingApproval, E::Approve) => Ok(S::Executing),
        (S::AwaitingApproval, E::Edit) => Ok(S::Resimulating),
        (S::AwaitingApproval, E::Reject) => Ok(S::Cancelled),
        (S::Resimulating, E::Resimulate) => Ok(S::Simulating),
        (S::Executing, E::Committed) => Ok(S::Executed),
        (S::Executing, E::ExecutionFailed) => Ok(S::AwaitingApproval),
        (from, event) => Err(WorkflowError::InvalidTransition { from, event }),
    }
}

/// A reviewer's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    #[serde(alias = "approve")]
    Approved,
    #[serde(alias = "reject")]
    Rejected,
    Edit,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Approved => write!(f, "approved"),
            Decision::Rejected => write!(f, "rejected"),
            Decision::Edit => write!(f, "edit"),
        }
    }
}

/// External command that resumes a suspended thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeCommand {
    pub decision: Decision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifications: Option<ProposalModifications>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ResumeCommand {
    pub fn approve() -> Self {
        Self {
            decision: Decision::Approved,
            modifications: None,
            notes: None,
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            decision: Decision::Rejected,
            modifications: None,
            notes: Some(reason.into()),
        }
    }

    pub fn edit(modifications: ProposalModifications) -> Self {
        Self {
            decision: Decision::Edit,
            modifications: Some(modifications),
            notes: None,
        }
    }

    /// The workflow event this command maps to.
    ///
    /// An approval that carries modifications is treated as an edit.
    pub fn event(&self) -> WorkflowEvent {
        let has_modifications = self
            .modifications
            .as_ref()
            .is_some_and(|m| !m.is_empty());

        match self.decision {
            Decision::Approved if has_modifications => WorkflowEvent::Edit,
            Decision::Approved => WorkflowEvent::Approve,
            Decision::Edit => WorkflowEvent::Edit,
            Decision::Rejected => WorkflowEvent::Reject,
        }
    }
}

/// Everything a reviewer needs to decide on a proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalCheckpoint {
    pub thread_id: String,
    /// Zero for the first proposal, incremented on every edit
    pub revision: u32,
    pub proposal: TradeProposal,
    pub portfolio_before: PortfolioView,
    pub portfolio_after: PortfolioView,
    pub risk_before: RiskSnapshot,
    pub risk_after: RiskSnapshot,
    pub modifiable_fields: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl ApprovalCheckpoint {
    /// The caller-facing approval payload.
    pub fn payload(&self) -> ApprovalPayload {
        ApprovalPayload {
            thread_id: self.thread_id.clone(),
            revision: self.revision,
            proposal: ProposalSummary::from(&self.proposal),
            portfolio_before: self.portfolio_before.clone(),
            portfolio_after: self.portfolio_after.clone(),
            risk_before: self.risk_before.clone(),
            risk_after: self.risk_after.clone(),
            risk_delta: self.risk_before.delta_to(&self.risk_after),
            modifiable_fields: self.modifiable_fields.clone(),
        }
    }
}

/// Proposal fields exposed in the approval payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalSummary {
    pub proposal_id: Uuid,
    pub ticker: String,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Decimal,
    pub total_amount: Decimal,
    pub order_kind: OrderKind,
}

impl From<&TradeProposal> for ProposalSummary {
    fn from(p: &TradeProposal) -> Self {
        Self {
            proposal_id: p.id,
            ticker: p.ticker.clone(),
            side: p.side,
            quantity: p.quantity,
            price: p.price,
            total_amount: p.total_amount,
            order_kind: p.order_kind,
        }
    }
}

/// Boundary contract shown to the reviewer while a thread is suspended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalPayload {
    pub thread_id: String,
    pub revision: u32,
    pub proposal: ProposalSummary,
    pub portfolio_before: PortfolioView,
    pub portfolio_after: PortfolioView,
    pub risk_before: RiskSnapshot,
    pub risk_after: RiskSnapshot,
    pub risk_delta: RiskDelta,
    pub modifiable_fields: Vec<String>,
}

/// Terminal result of a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkflowOutcome {
    Executed(ExecutionResult),
    Cancelled(CancellationRecord),
}

/// One decision applied to a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub revision: u32,
    pub proposal_id: Uuid,
    pub decision: Decision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub at: DateTime<Utc>,
}

/// Durable per-thread workflow record held by the checkpoint store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadState {
    pub thread_id: String,
    pub portfolio_id: String,
    pub stage: WorkflowStage,
    /// Portfolio as it was when the thread started; every simulation of this
    /// thread starts from here
    pub original_portfolio: Portfolio,
    /// Pending checkpoint while suspended
    pub checkpoint: Option<ApprovalCheckpoint>,
    /// Approved proposal while executing
    pub approved: Option<TradeProposal>,
    pub outcome: Option<WorkflowOutcome>,
    pub revision: u32,
    pub history: Vec<DecisionRecord>,
    pub updated_at: DateTime<Utc>,
}

impl ThreadState {
    /// Fresh thread in `Planning`, anchored to the portfolio as it is now.
    pub fn new(thread_id: impl Into<String>, original_portfolio: Portfolio) -> Self {
        Self {
            thread_id: thread_id.into(),
            portfolio_id: original_portfolio.id.clone(),
            stage: WorkflowStage::Planning,
            original_portfolio,
            checkpoint: None,
            approved: None,
            outcome: None,
            revision: 0,
            history: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Move to the next stage, validating the transition.
    pub fn advance(&mut self, event: WorkflowEvent) -> Result<WorkflowStage, WorkflowError> {
        self.stage = transition(self.stage, event)?;
        self.updated_at = Utc::now();
        Ok(self.stage)
    }

    /// Check if the thread has reached a terminal stage.
    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }
}
