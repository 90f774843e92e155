//! CLI command implementations.

pub mod ask;
pub mod init_portfolio;
pub mod propose;
pub mod resume;
pub mod status;
pub mod validate;
