//! Supervisor: classify, fan out, merge, hand off.

use advisor_core::error::CapabilityError;
use advisor_core::traits::CapabilityInput;
use advisor_core::types::{ApprovalPayload, RiskLevel, TradeRequest};
use advisor_workflow::ApprovalGate;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::{CapabilityRegistry, DispatchError, Intent, RouteTable};

/// Name of the optional external intent classifier capability.
pub const CLASSIFIER: &str = "classifier";

/// Supervisor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Per-capability timeout
    pub timeout_ms: u64,
    /// 1 = advisory only; above 1 every trade or rebalance needs approval
    pub automation_level: u8,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            automation_level: 2,
        }
    }
}

/// A request to the supervisor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub request: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub portfolio_id: Option<String>,
    /// Trade extracted upstream, if any
    #[serde(default)]
    pub trade: Option<TradeRequest>,
    #[serde(default)]
    pub params: Value,
}

/// Successful capability output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityOutput {
    pub name: String,
    pub data: Value,
}

/// Failed capability call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityFailure {
    pub name: String,
    pub error: String,
}

/// Outputs of one fan-out, in route order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedResult {
    pub intent: Intent,
    pub outputs: Vec<CapabilityOutput>,
    pub failures: Vec<CapabilityFailure>,
    /// Highest `risk_level` any capability reported
    pub highest_risk: Option<RiskLevel>,
    pub elapsed_ms: u64,
}

impl MergedResult {
    pub fn output(&self, name: &str) -> Option<&Value> {
        self.outputs.iter().find(|o| o.name == name).map(|o| &o.data)
    }

    /// Check if every invoked capability failed.
    pub fn all_failed(&self) -> bool {
        self.outputs.is_empty() && !self.failures.is_empty()
    }
}

/// What the supervisor did with a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Merged capability outputs returned to the caller; nothing executed
    Answer {
        merged: MergedResult,
        trade: Option<TradeRequest>,
        approval_required: bool,
    },
    /// A trade was handed to the approval gate
    AwaitingApproval {
        merged: MergedResult,
        payload: ApprovalPayload,
    },
}

/// Routes requests to capabilities and trades to the approval gate.
pub struct Supervisor {
    registry: Arc<CapabilityRegistry>,
    routes: RouteTable,
    config: SupervisorConfig,
    gate: Option<Arc<ApprovalGate>>,
}

impl Supervisor {
    pub fn new(registry: Arc<CapabilityRegistry>, routes: RouteTable, config: SupervisorConfig) -> Self {
        Self {
            registry,
            routes,
            config,
            gate: None,
        }
    }

    /// Attach the approval gate trades are handed to.
    pub fn with_gate(mut self, gate: Arc<ApprovalGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Handle a request end to end.
    pub async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchOutcome, DispatchError> {
        let intent = self.classify(&request).await;
        let input = CapabilityInput {
            request: request.request.clone(),
            intent: intent.to_string(),
            thread_id: request.thread_id.clone(),
            portfolio_id: request.portfolio_id.clone(),
            params: request.params.clone(),
        };

        let mut merged = self.fan_out(intent, input).await;
        let approval_required = self.requires_approval(&merged);
        let gated = approval_required && self.gate.is_some();
        let trade = match request.trade {
            Some(trade) => Some(trade),
            None if intent.is_transactional() || gated => trade_from_outputs(&mut merged),
            None => None,
        };

        let (Some(trade), Some(gate), true) = (trade.clone(), &self.gate, approval_required) else {
            debug!(intent = %intent, approval_required, "Returning merged result");
            return Ok(DispatchOutcome::Answer {
                merged,
                trade,
                approval_required,
            });
        };

        let thread_id = request
            .thread_id
            .as_deref()
            .ok_or(DispatchError::MissingField("thread_id"))?;
        let portfolio_id = request
            .portfolio_id
            .as_deref()
            .ok_or(DispatchError::MissingField("portfolio_id"))?;

        info!(thread_id, intent = %intent, ticker = %trade.ticker, "Handing trade to approval gate");
        let payload = gate.start(thread_id, portfolio_id, &trade).await?;
        Ok(DispatchOutcome::AwaitingApproval { merged, payload })
    }

    /// Classify a request, preferring a registered classifier capability.
    pub async fn classify(&self, request: &DispatchRequest) -> Intent {
        if let Some(classifier) = self.registry.get(CLASSIFIER) {
            let input = CapabilityInput {
                request: request.request.clone(),
                params: request.params.clone(),
                ..Default::default()
            };
            let result = tokio::time::timeout(self.timeout(), classifier.invoke(&input)).await;
            let intent = match result {
                Ok(Ok(value)) => value
                    .get("intent")
                    .and_then(Value::as_str)
                    .and_then(|s| s.parse::<Intent>().ok()),
                Ok(Err(e)) => {
                    warn!(error = %e, "Classifier failed, using keywords");
                    None
                }
                Err(_) => {
                    warn!(timeout_ms = self.config.timeout_ms, "Classifier timed out, using keywords");
                    None
                }
            };
            if let Some(intent) = intent {
                return intent;
            }
        }

        Intent::classify_keywords(&request.request)
    }

    /// Invoke every capability routed for `intent` concurrently.
    ///
    /// Waits for all of them to settle. Errors, timeouts and panics become
    /// failure records; they never fail the dispatch.
    pub async fn fan_out(&self, intent: Intent, input: CapabilityInput) -> MergedResult {
        let names = self.routes.resolve(intent, &self.registry);
        let started = Instant::now();
        let timeout = self.timeout();
        let input = Arc::new(input);

        let handles: Vec<_> = names
            .iter()
            .filter_map(|name| self.registry.get(name))
            .map(|capability| {
                let input = Arc::clone(&input);
                tokio::spawn(async move {
                    tokio::time::timeout(timeout, capability.invoke(&input)).await
                })
            })
            .collect();

        let results = join_all(handles).await;

        let mut outputs = Vec::new();
        let mut failures = Vec::new();
        for (name, result) in names.into_iter().zip(results) {
            let result = match result {
                Ok(Ok(result)) => result,
                Ok(Err(_)) => Err(CapabilityError::Timeout {
                    name: name.clone(),
                    timeout_ms: self.config.timeout_ms,
                }),
                Err(e) if e.is_panic() => Err(CapabilityError::Panicked { name: name.clone() }),
                Err(e) => Err(CapabilityError::Failed {
                    name: name.clone(),
                    reason: e.to_string(),
                }),
            };

            match result {
                Ok(data) => outputs.push(CapabilityOutput { name, data }),
                Err(e) => {
                    warn!(capability = %name, error = %e, "Capability failed");
                    failures.push(CapabilityFailure {
                        name,
                        error: e.to_string(),
                    });
                }
            }
        }

        let highest_risk = outputs.iter().filter_map(|o| risk_level(&o.data)).max();
        let elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            intent = %intent,
            succeeded = outputs.len(),
            failed = failures.len(),
            elapsed_ms,
            "Fan-out complete"
        );

        MergedResult {
            intent,
            outputs,
            failures,
            highest_risk,
            elapsed_ms,
        }
    }

    /// Approval policy.
    ///
    /// Trades and rebalances need approval above automation level 1. Any
    /// capability reporting high risk forces approval regardless.
    pub fn requires_approval(&self, merged: &MergedResult) -> bool {
        (merged.intent.is_transactional() && self.config.automation_level > 1)
            || merged.highest_risk == Some(RiskLevel::High)
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.timeout_ms)
    }
}

fn risk_level(data: &Value) -> Option<RiskLevel> {
    data.get("risk_level")?.as_str()?.parse().ok()
}

/// First valid `trade` object found in the outputs, in route order.
///
/// A malformed trade is recorded as a failure of the capability that sent
/// it; the rest of that capability's output is kept.
fn trade_from_outputs(merged: &mut MergedResult) -> Option<TradeRequest> {
    let mut found = None;
    for output in &merged.outputs {
        let Some(raw) = output.data.get("trade") else {
            continue;
        };
        match serde_json::from_value::<TradeRequest>(raw.clone()) {
            Ok(trade) => {
                found = Some(trade);
                break;
            }
            Err(e) => {
                warn!(capability = %output.name, error = %e, "Ignoring invalid trade in capability output");
                merged.failures.push(CapabilityFailure {
                    name: output.name.clone(),
                    error: format!("invalid trade: {e}"),
                });
            }
        }
    }
    found
}
