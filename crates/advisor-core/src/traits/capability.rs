//! Analysis capability trait.

use crate::error::CapabilityError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured input handed to every capability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilityInput {
    /// Raw request text
    pub request: String,
    /// Classified intent name
    pub intent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio_id: Option<String>,
    /// Free-form parameters from upstream
    #[serde(default)]
    pub params: Value,
}

/// Whether a capability call succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityStatus {
    Success,
    Failure,
}

/// Wire shape of a capability result: `{status, data?, error?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityResponse {
    pub status: CapabilityStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CapabilityResponse {
    pub fn success(data: Value) -> Self {
        Self {
            status: CapabilityStatus::Success,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            status: CapabilityStatus::Failure,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Convert into a result, attributing failures to `name`.
    pub fn into_result(self, name: &str) -> Result<Value, CapabilityError> {
        match self.status {
            CapabilityStatus::Success => Ok(self.data.unwrap_or(Value::Null)),
            CapabilityStatus::Failure => Err(CapabilityError::Failed {
                name: name.to_string(),
                reason: self.error.unwrap_or_else(|| "unspecified failure".to_string()),
            }),
        }
    }
}

impl From<Result<Value, CapabilityError>> for CapabilityResponse {
    fn from(result: Result<Value, CapabilityError>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}

/// A named, black-box analysis capability (research, strategy, risk, ...).
///
/// Implementations must be cheap to share; the dispatcher holds them behind
/// `Arc` and invokes several concurrently.
#[async_trait]
pub trait Capability: Send + Sync {
    /// Registry name of this capability.
    fn name(&self) -> &str;

    /// Run the capability.
    async fn invoke(&self, input: &CapabilityInput) -> Result<Value, CapabilityError>;
}
