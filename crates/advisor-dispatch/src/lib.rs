//! Request dispatch.
//!
//! Classifies a request into an intent, fans it out to the registered
//! capabilities for that intent and merges their outputs. Results that call
//! for a trade are handed to the approval gate.

mod builtin;
mod error;
mod http;
mod intent;
mod registry;
mod routes;
mod supervisor;

pub use builtin::{PortfolioCapability, RiskCapability};
pub use error::DispatchError;
pub use http::HttpCapability;
pub use intent::Intent;
pub use registry::CapabilityRegistry;
pub use routes::RouteTable;
pub use supervisor::{
    CapabilityFailure, CapabilityOutput, DispatchOutcome, DispatchRequest, MergedResult,
    Supervisor, SupervisorConfig,
};
