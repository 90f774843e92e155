//! Core types and traits for the investment advisory workflow.
//!
//! This crate provides the foundational building blocks including:
//! - Portfolio, position and trade proposal types
//! - Risk snapshots and the approval checkpoint model
//! - The workflow transition function
//! - Seam traits for market data, analysis capabilities, checkpoint
//!   persistence and the portfolio ledger

pub mod error;
pub mod traits;
pub mod types;

pub use error::{AdvisorError, AdvisorResult};
pub use traits::*;
pub use types::*;
