//! CSV directory market data.

use advisor_core::error::DataError;
use advisor_core::traits::MarketData;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Price file record format.
#[derive(Debug, Deserialize)]
struct CloseRecord {
    #[serde(alias = "Date", alias = "date", alias = "timestamp", alias = "Timestamp")]
    date: String,
    #[serde(alias = "Close", alias = "close", alias = "Adj Close")]
    close: f64,
}

/// Sector file record format.
#[derive(Debug, Deserialize)]
struct SectorRecord {
    #[serde(alias = "Ticker", alias = "symbol", alias = "Symbol")]
    ticker: String,
    #[serde(alias = "Sector")]
    sector: String,
}

/// Market data read from a directory of per-ticker CSV files.
///
/// Each ticker lives in `{TICKER}.csv`, `{ticker}.csv` or `{TICKER}_daily.csv`
/// with at least a date and a close column. An optional `sectors.csv` maps
/// tickers to sectors. Files are parsed once and cached.
pub struct CsvMarketData {
    dir: PathBuf,
    cache: RwLock<HashMap<String, Arc<Vec<f64>>>>,
    sectors: HashMap<String, String>,
}

impl CsvMarketData {
    /// Open a data directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, DataError> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(DataError::NoDataAvailable(dir.display().to_string()));
        }

        let sectors_path = dir.join("sectors.csv");
        let sectors = if sectors_path.exists() {
            load_sectors(&sectors_path)?
        } else {
            HashMap::new()
        };

        Ok(Self {
            dir,
            cache: RwLock::new(HashMap::new()),
            sectors,
        })
    }

    fn locate(&self, ticker: &str) -> Option<PathBuf> {
        let lower = ticker.to_lowercase();
        [
            self.dir.join(format!("{ticker}.csv")),
            self.dir.join(format!("{lower}.csv")),
            self.dir.join(format!("{ticker}_daily.csv")),
            self.dir.join(format!("{lower}_daily.csv")),
        ]
        .into_iter()
        .find(|p| p.exists())
    }

    async fn closes(&self, ticker: &str) -> Result<Arc<Vec<f64>>, DataError> {
        if let Some(closes) = self.cache.read().await.get(ticker) {
            return Ok(closes.clone());
        }

        let path = self
            .locate(ticker)
            .ok_or_else(|| DataError::TickerNotFound(ticker.to_string()))?;
        let closes = Arc::new(load_closes(&path)?);
        debug!(ticker, rows = closes.len(), path = %path.display(), "Loaded price file");

        self.cache
            .write()
            .await
            .insert(ticker.to_string(), closes.clone());
        Ok(closes)
    }
}

#[async_trait]
impl MarketData for CsvMarketData {
    async fn latest_price(&self, ticker: &str) -> Result<Decimal, DataError> {
        let closes = self.closes(ticker).await?;
        let last = closes
            .last()
            .copied()
            .ok_or_else(|| DataError::NoDataAvailable(ticker.to_string()))?;
        Decimal::try_from(last).map_err(|e| DataError::ParseError(e.to_string()))
    }

    async fn daily_closes(&self, ticker: &str, observations: usize) -> Result<Vec<f64>, DataError> {
        let closes = self.closes(ticker).await?;
        if closes.is_empty() {
            return Err(DataError::NoDataAvailable(ticker.to_string()));
        }
        Ok(closes[closes.len().saturating_sub(observations)..].to_vec())
    }

    async fn sector(&self, ticker: &str) -> Result<Option<String>, DataError> {
        Ok(self.sectors.get(ticker).cloned())
    }

    fn name(&self) -> &str {
        "CSV"
    }
}

/// Load closes sorted by date.
fn load_closes(path: &Path) -> Result<Vec<f64>, DataError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| DataError::ParseError(e.to_string()))?;

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let record: CloseRecord = result.map_err(|e| DataError::ParseError(e.to_string()))?;
        rows.push((parse_timestamp(&record.date)?, record.close));
    }
    rows.sort_by_key(|(ts, _)| *ts);

    Ok(rows.into_iter().map(|(_, close)| close).collect())
}

fn load_sectors(path: &Path) -> Result<HashMap<String, String>, DataError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| DataError::ParseError(e.to_string()))?;

    reader
        .deserialize()
        .map(|r| {
            r.map(|rec: SectorRecord| (rec.ticker, rec.sector))
                .map_err(|e| DataError::ParseError(e.to_string()))
        })
        .collect()
}

/// Parse various timestamp formats into Unix milliseconds.
fn parse_timestamp(date_str: &str) -> Result<i64, DataError> {
    let formats = ["%Y-%m-%d", "%Y-%m-%d %H:%M:%S", "%Y/%m/%d", "%m/%d/%Y"];

    for format in formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
        if let Some(dt) = NaiveDate::parse_from_str(date_str, format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }

    if let Ok(ts) = date_str.parse::<i64>() {
        // Seconds unless it already looks like milliseconds
        return Ok(if ts > 10_000_000_000 { ts } else { ts * 1000 });
    }

    Err(DataError::ParseError(format!("Could not parse date: {date_str}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("advisor-data-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_parse_timestamp() {
        assert!(parse_timestamp("2024-01-15").is_ok());
        assert!(parse_timestamp("2024-01-15 10:30:00").is_ok());
        assert!(parse_timestamp("01/15/2024").is_ok());
        assert!(parse_timestamp("1705312800").is_ok());
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[tokio::test]
    async fn test_loads_sorted_closes_and_sectors() {
        let dir = temp_dir();
        std::fs::write(
            dir.join("AAA.csv"),
            "date,open,close\n2024-01-03,1,102.5\n2024-01-01,1,100\n2024-01-02,1,101\n",
        )
        .unwrap();
        std::fs::write(dir.join("sectors.csv"), "ticker,sector\nAAA,Tech\n").unwrap();

        let feed = CsvMarketData::new(&dir).unwrap();
        assert_eq!(
            feed.daily_closes("AAA", 60).await.unwrap(),
            vec![100.0, 101.0, 102.5]
        );
        assert_eq!(feed.latest_price("AAA").await.unwrap(), dec!(102.5));
        assert_eq!(feed.sector("AAA").await.unwrap().as_deref(), Some("Tech"));
        assert!(feed.latest_price("BBB").await.is_err());

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_missing_directory() {
        assert!(CsvMarketData::new("/definitely/not/here").is_err());
    }
}
