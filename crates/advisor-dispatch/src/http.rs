//! Remote capability over HTTP.

use advisor_core::error::CapabilityError;
use advisor_core::traits::{Capability, CapabilityInput, CapabilityResponse};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Capability served by a remote endpoint.
///
/// The input is POSTed as JSON; the endpoint answers with
/// `{status, data?, error?}`.
pub struct HttpCapability {
    name: String,
    url: String,
    client: Client,
}

impl HttpCapability {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Result<Self, CapabilityError> {
        Self::with_timeout(name, url, None)
    }

    /// Create with a request timeout.
    pub fn with_timeout(
        name: impl Into<String>,
        url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, CapabilityError> {
        let name = name.into();
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| CapabilityError::Failed {
            name: name.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            name,
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Capability for HttpCapability {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, input: &CapabilityInput) -> Result<Value, CapabilityError> {
        let failed = |reason: String| CapabilityError::Failed {
            name: self.name.clone(),
            reason,
        };

        debug!(capability = %self.name, url = %self.url, "Invoking remote capability");
        let resp = self
            .client
            .post(&self.url)
            .json(input)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(failed(format!("{status}: {text}")));
        }

        let response: CapabilityResponse =
            resp.json().await.map_err(|e| CapabilityError::InvalidResponse {
                name: self.name.clone(),
                reason: e.to_string(),
            })?;

        response.into_result(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_endpoint_is_failure() {
        let capability = HttpCapability::with_timeout(
            "research",
            "http://127.0.0.1:9/analyze",
            Some(Duration::from_millis(500)),
        )
        .unwrap();

        let err = capability
            .invoke(&CapabilityInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CapabilityError::Failed { name, .. } if name == "research"));
    }
}
