//! Seam traits for external collaborators.

mod capability;
mod ledger;
mod market_data;
mod store;

pub use capability::{Capability, CapabilityInput, CapabilityResponse, CapabilityStatus};
pub use ledger::PortfolioLedger;
pub use market_data::{mark_to_market, MarketData};
pub use store::{validate_thread_id, CheckpointStore};
