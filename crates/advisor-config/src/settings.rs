//! Configuration structures.

use advisor_dispatch::SupervisorConfig;
use advisor_ledger::ExecutorConfig;
use advisor_risk::RiskConfig;
use config::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub workflow: WorkflowSettings,
    #[serde(default)]
    pub dispatch: DispatchSettings,
    #[serde(default)]
    pub market_data: MarketDataSettings,
}

impl AppConfig {
    /// Reject values the components cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Message(msg.to_string()));

        if self.risk.lookback < 2 {
            return invalid("risk.lookback must be at least 2");
        }
        if self.risk.benchmark.trim().is_empty() {
            return invalid("risk.benchmark must not be empty");
        }
        if self.workflow.max_commit_retries == 0 {
            return invalid("workflow.max_commit_retries must be at least 1");
        }
        if self.dispatch.timeout_ms < 10 {
            return invalid("dispatch.timeout_ms must be at least 10");
        }
        if !(1..=3).contains(&self.dispatch.automation_level) {
            return invalid("dispatch.automation_level must be 1, 2 or 3");
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return invalid("logging.format must be \"pretty\" or \"json\"");
        }
        Ok(())
    }
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "investment-advisor".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "pretty" or "json"
    pub format: String,
    /// Directory for daily-rolling log files
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

/// Checkpoint and ledger storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowSettings {
    pub checkpoint_dir: PathBuf,
    pub ledger_path: PathBuf,
    pub max_commit_retries: u32,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            checkpoint_dir: PathBuf::from("data/checkpoints"),
            ledger_path: PathBuf::from("data/ledger.json"),
            max_commit_retries: ExecutorConfig::default().max_commit_retries,
        }
    }
}

impl WorkflowSettings {
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            max_commit_retries: self.max_commit_retries,
        }
    }
}

/// Supervisor and capability settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    pub timeout_ms: u64,
    pub automation_level: u8,
    /// Intent name to capability names, overriding the built-in routes
    pub routes: HashMap<String, Vec<String>>,
    pub fallback: Option<Vec<String>>,
    /// Remote capability name to endpoint URL
    pub endpoints: HashMap<String, String>,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        let supervisor = SupervisorConfig::default();
        Self {
            timeout_ms: supervisor.timeout_ms,
            automation_level: supervisor.automation_level,
            routes: HashMap::new(),
            fallback: None,
            endpoints: HashMap::new(),
        }
    }
}

impl DispatchSettings {
    pub fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig {
            timeout_ms: self.timeout_ms,
            automation_level: self.automation_level,
        }
    }
}

/// Market data source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketDataSettings {
    /// Directory of `<TICKER>.csv` files and an optional `sectors.csv`
    pub dir: PathBuf,
}

impl Default for MarketDataSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/market"),
        }
    }
}
