//! Market data sources for proposal pricing and risk history.

mod csv_source;
mod static_source;

pub use csv_source::CsvMarketData;
pub use static_source::StaticMarketData;
