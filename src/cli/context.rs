//! Component wiring for CLI commands.

use advisor_config::AppConfig;
use advisor_core::traits::MarketData;
use advisor_data::{CsvMarketData, StaticMarketData};
use advisor_dispatch::{
    CapabilityRegistry, HttpCapability, PortfolioCapability, RiskCapability, RouteTable, Supervisor,
};
use advisor_ledger::{Executor, FileLedger};
use advisor_risk::RiskEngine;
use advisor_workflow::{ApprovalGate, FileCheckpointStore, PortfolioSimulator, ProposalBuilder};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// File-backed components shared by the commands.
pub struct AppContext {
    pub config: AppConfig,
    pub ledger: Arc<FileLedger>,
    pub market: Arc<dyn MarketData>,
    pub gate: Arc<ApprovalGate>,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Self {
        let ledger = Arc::new(FileLedger::new(&config.workflow.ledger_path));

        let market: Arc<dyn MarketData> = match CsvMarketData::new(&config.market_data.dir) {
            Ok(csv) => Arc::new(csv),
            Err(e) => {
                warn!(
                    dir = %config.market_data.dir.display(),
                    error = %e,
                    "Market data unavailable; trades need an explicit price"
                );
                Arc::new(StaticMarketData::new())
            }
        };

        let gate = ApprovalGate::new(
            Arc::new(FileCheckpointStore::new(&config.workflow.checkpoint_dir)),
            ProposalBuilder::new(market.clone()),
            PortfolioSimulator::new(RiskEngine::new(config.risk.clone()), market.clone()),
            Executor::new(ledger.clone())
                .with_market(market.clone())
                .with_config(config.workflow.executor_config()),
        );

        Self {
            config,
            ledger,
            market,
            gate: Arc::new(gate),
        }
    }

    /// Supervisor over the local capabilities plus configured remote ones.
    pub fn supervisor(&self) -> Result<Supervisor> {
        let dispatch = &self.config.dispatch;
        let simulator = Arc::new(PortfolioSimulator::new(
            RiskEngine::new(self.config.risk.clone()),
            self.market.clone(),
        ));

        let mut registry = CapabilityRegistry::new()
            .with(Arc::new(PortfolioCapability::new(self.ledger.clone())))
            .with(Arc::new(RiskCapability::new(self.ledger.clone(), simulator)));

        for (name, url) in &dispatch.endpoints {
            let capability = HttpCapability::with_timeout(
                name.as_str(),
                url.as_str(),
                Some(Duration::from_millis(dispatch.timeout_ms)),
            )
            .with_context(|| format!("Failed to set up capability {name}"))?;
            debug!(capability = %name, url = %url, "Registered remote capability");
            registry.register(Arc::new(capability));
        }

        let routes = RouteTable::with_overrides(&dispatch.routes, dispatch.fallback.clone())
            .context("Invalid dispatch.routes")?;

        Ok(Supervisor::new(Arc::new(registry), routes, dispatch.supervisor_config())
            .with_gate(self.gate.clone()))
    }
}
