//! Trade approval workflow.
//!
//! A requested trade is normalized into a proposal, simulated against a copy
//! of the portfolio and parked at an approval checkpoint. A reviewer's
//! decision later resumes the thread: approval commits the trade through the
//! executor, an edit re-simulates from the original portfolio, a rejection
//! cancels.

mod builder;
mod gate;
mod simulator;
pub mod store;

pub use builder::ProposalBuilder;
pub use gate::{ApprovalGate, ResumeOutcome};
pub use simulator::{PortfolioSimulator, Simulation};
pub use store::{FileCheckpointStore, MemoryCheckpointStore};
