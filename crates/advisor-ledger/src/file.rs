//! JSON file ledger.

use advisor_core::error::LedgerError;
use advisor_core::traits::PortfolioLedger;
use advisor_core::types::{ExecutionResult, Portfolio};
use async_trait::async_trait;
use fd_lock::RwLock as FileLock;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::LedgerBook;

/// Ledger persisted as a single JSON document.
///
/// Every operation re-reads the file so that separate CLI invocations see each
/// other's commits. Mutations hold an exclusive OS lock on a sidecar
/// `<ledger>.json.lock` file for the whole read-check-write, so handles in
/// different processes serialize their compare-and-set. Writes go to a
/// uniquely named temporary file that is renamed over the ledger; readers
/// never see a partial document and the portfolio mutation and its execution
/// record land together or not at all.
pub struct FileLedger {
    path: PathBuf,
}

impl FileLedger {
    /// Open (or lazily create) a ledger file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the ledger file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<LedgerBook, LedgerError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => parse(&json),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(LedgerBook::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Run `f` against the stored book under the exclusive file lock and
    /// persist the result.
    async fn update<R, F>(&self, f: F) -> Result<R, LedgerError>
    where
        R: Send + 'static,
        F: FnOnce(&mut LedgerBook) -> Result<R, LedgerError> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || update_locked(&path, f))
            .await
            .map_err(|e| LedgerError::Io(std::io::Error::other(e.to_string())))?
    }
}

fn parse(json: &str) -> Result<LedgerBook, LedgerError> {
    serde_json::from_str(json).map_err(|e| LedgerError::Serialization(e.to_string()))
}

fn update_locked<R>(
    path: &Path,
    f: impl FnOnce(&mut LedgerBook) -> Result<R, LedgerError>,
) -> Result<R, LedgerError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let lock_file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path.with_extension("json.lock"))?;
    let mut lock = FileLock::new(lock_file);
    let _guard = lock.write()?;

    let mut book = match fs::read_to_string(path) {
        Ok(json) => parse(&json)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => LedgerBook::default(),
        Err(e) => return Err(e.into()),
    };

    let result = f(&mut book)?;

    let json = serde_json::to_string_pretty(&book)
        .map_err(|e| LedgerError::Serialization(e.to_string()))?;
    let tmp_path = path.with_extension(format!("json.{}.tmp", Uuid::new_v4().simple()));
    fs::write(&tmp_path, json)?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        fs::remove_file(&tmp_path).ok();
        return Err(e.into());
    }

    debug!(path = %path.display(), "Ledger written");
    Ok(result)
}

#[async_trait]
impl PortfolioLedger for FileLedger {
    async fn portfolio(&self, portfolio_id: &str) -> Result<Portfolio, LedgerError> {
        self.read().await?.portfolio(portfolio_id)
    }

    async fn execution_for(&self, proposal_id: Uuid) -> Result<Option<ExecutionResult>, LedgerError> {
        Ok(self.read().await?.executions.get(&proposal_id).cloned())
    }

    async fn commit(
        &self,
        expected_version: u64,
        portfolio: Portfolio,
        execution: ExecutionResult,
    ) -> Result<Portfolio, LedgerError> {
        let stored = self
            .update(move |book| book.commit(expected_version, portfolio, execution))
            .await?;

        info!(portfolio_id = %stored.id, version = stored.version, "Ledger commit persisted");
        Ok(stored)
    }

    async fn upsert(&self, portfolio: Portfolio) -> Result<Portfolio, LedgerError> {
        self.update(move |book| Ok(book.upsert(portfolio))).await
    }
}
