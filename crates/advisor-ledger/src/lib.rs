//! Portfolio ledgers and the trade executor.
//!
//! The ledger is the system of record for real portfolios. The executor is
//! the only component that writes to it.

mod book;
mod executor;
mod file;
mod memory;

pub use book::LedgerBook;
pub use executor::{Executor, ExecutorConfig};
pub use file::FileLedger;
pub use memory::MemoryLedger;
