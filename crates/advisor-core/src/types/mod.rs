//! Core data types for the advisory workflow.

mod execution;
mod order;
mod portfolio;
mod risk;
mod workflow;

pub use execution::{CancellationRecord, ExecutionResult, ExecutionStatus};
pub use order::{OrderKind, ProposalModifications, ProposalStatus, Side, TradeProposal, TradeRequest};
pub use portfolio::{Portfolio, PortfolioView, Position, PositionView};
pub use risk::{RiskDelta, RiskLevel, RiskSnapshot};
pub use workflow::{
    transition, ApprovalCheckpoint, ApprovalPayload, Decision, DecisionRecord, ProposalSummary,
    ResumeCommand, ThreadState, WorkflowEvent, WorkflowOutcome, WorkflowStage,
};
