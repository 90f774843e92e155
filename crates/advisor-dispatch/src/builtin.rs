//! Capabilities backed by local components.

use advisor_core::error::CapabilityError;
use advisor_core::traits::{Capability, CapabilityInput, PortfolioLedger};
use advisor_workflow::PortfolioSimulator;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

fn portfolio_id<'a>(name: &str, input: &'a CapabilityInput) -> Result<&'a str, CapabilityError> {
    input
        .portfolio_id
        .as_deref()
        .ok_or_else(|| CapabilityError::Failed {
            name: name.to_string(),
            reason: "request carries no portfolio_id".to_string(),
        })
}

/// Reports the current portfolio with weights.
pub struct PortfolioCapability {
    ledger: Arc<dyn PortfolioLedger>,
}

impl PortfolioCapability {
    pub const NAME: &'static str = "portfolio";

    pub fn new(ledger: Arc<dyn PortfolioLedger>) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl Capability for PortfolioCapability {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn invoke(&self, input: &CapabilityInput) -> Result<Value, CapabilityError> {
        let id = portfolio_id(Self::NAME, input)?;
        let portfolio = self
            .ledger
            .portfolio(id)
            .await
            .map_err(|e| CapabilityError::Failed {
                name: Self::NAME.to_string(),
                reason: e.to_string(),
            })?;

        Ok(json!({ "portfolio": portfolio.view() }))
    }
}

/// Runs the risk engine on the current portfolio.
///
/// Output carries `risk_level`, which the supervisor reads when deciding
/// whether approval is required.
pub struct RiskCapability {
    ledger: Arc<dyn PortfolioLedger>,
    simulator: Arc<PortfolioSimulator>,
}

impl RiskCapability {
    pub const NAME: &'static str = "risk";

    pub fn new(ledger: Arc<dyn PortfolioLedger>, simulator: Arc<PortfolioSimulator>) -> Self {
        Self { ledger, simulator }
    }
}

#[async_trait]
impl Capability for RiskCapability {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn invoke(&self, input: &CapabilityInput) -> Result<Value, CapabilityError> {
        let failed = |reason: String| CapabilityError::Failed {
            name: Self::NAME.to_string(),
            reason,
        };

        let id = portfolio_id(Self::NAME, input)?;
        let portfolio = self
            .ledger
            .portfolio(id)
            .await
            .map_err(|e| failed(e.to_string()))?;
        let snapshot = self
            .simulator
            .assess(&portfolio)
            .await
            .map_err(|e| failed(e.to_string()))?;

        Ok(json!({
            "risk_level": snapshot.overall_level(),
            "snapshot": snapshot,
        }))
    }
}
