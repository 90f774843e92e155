//! Error types for the advisory workflow.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::types::{WorkflowEvent, WorkflowStage};

/// Top-level advisor error.
#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Proposal error: {0}")]
    Proposal(#[from] ProposalError),

    #[error("Trade error: {0}")]
    Trade(#[from] TradeError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] SimulationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Capability error: {0}")]
    Capability(#[from] CapabilityError),

    #[error("Checkpoint store error: {0}")]
    Store(#[from] StoreError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while building a trade proposal.
#[derive(Error, Debug)]
pub enum ProposalError {
    #[error("Price unavailable for {ticker}: {reason}")]
    PriceUnavailable { ticker: String, reason: String },

    #[error("Invalid quantity: {0} (must be greater than zero)")]
    InvalidQuantity(Decimal),

    #[error("Invalid price: {0} (must not be negative)")]
    InvalidPrice(Decimal),

    #[error("Invalid ticker: {0:?}")]
    InvalidTicker(String),

    #[error("Order amount out of range: {quantity} x {price}")]
    AmountOverflow { quantity: Decimal, price: Decimal },
}

/// Errors raised when a trade cannot be applied to a portfolio.
///
/// Shared by the simulator and the executor so that a drifted live portfolio
/// fails with the same kind the human saw at simulation time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TradeError {
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Decimal, available: Decimal },

    #[error("Insufficient holdings of {ticker}: requested {requested}, held {held}")]
    InsufficientHoldings {
        ticker: String,
        requested: Decimal,
        held: Decimal,
    },

    #[error("Trade of {ticker} is out of range: {quantity} x {price}")]
    AmountOverflow {
        ticker: String,
        quantity: Decimal,
        price: Decimal,
    },
}

/// Errors raised by the portfolio simulator.
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error(transparent)]
    Trade(#[from] TradeError),

    #[error("Simulation failed: {0}")]
    Failure(String),
}

impl SimulationError {
    /// Whether the caller can fix this by submitting a corrected proposal.
    pub fn is_correctable(&self) -> bool {
        matches!(self, SimulationError::Trade(_))
    }
}

/// Errors raised by the executor.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error(transparent)]
    Trade(#[from] TradeError),

    #[error("Stale state for portfolio {portfolio_id}: {reason}")]
    StaleState { portfolio_id: String, reason: String },

    #[error("Proposal {0} is not approved")]
    NotApproved(Uuid),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Errors raised by a single analysis capability.
#[derive(Error, Debug, Clone)]
pub enum CapabilityError {
    #[error("Capability {name} failed: {reason}")]
    Failed { name: String, reason: String },

    #[error("Capability {name} timed out after {timeout_ms}ms")]
    Timeout { name: String, timeout_ms: u64 },

    #[error("Capability {name} panicked")]
    Panicked { name: String },

    #[error("Capability not registered: {0}")]
    NotRegistered(String),

    #[error("Invalid capability response from {name}: {reason}")]
    InvalidResponse { name: String, reason: String },
}

/// Checkpoint store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid thread id: {0:?}")]
    InvalidThreadId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Portfolio ledger errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Portfolio not found: {0}")]
    PortfolioNotFound(String),

    #[error("Version conflict on portfolio {portfolio_id}: expected {expected}, found {found}")]
    VersionConflict {
        portfolio_id: String,
        expected: u64,
        found: u64,
    },

    #[error("Proposal {0} already executed")]
    AlreadyExecuted(Uuid),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Market data errors.
#[derive(Error, Debug, Clone)]
pub enum DataError {
    #[error("Ticker not found: {0}")]
    TickerNotFound(String),

    #[error("No data available for {0}")]
    NoDataAvailable(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),
}

/// Approval workflow errors.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Thread already exists: {0}")]
    ThreadExists(String),

    #[error("Invalid transition from {from} on {event}")]
    InvalidTransition {
        from: WorkflowStage,
        event: WorkflowEvent,
    },

    #[error("Invalid modification: {0}")]
    InvalidModification(String),

    #[error(transparent)]
    Proposal(#[from] ProposalError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Result type alias for advisor operations.
pub type AdvisorResult<T> = Result<T, AdvisorError>;
