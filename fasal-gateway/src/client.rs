//! HTTP client for the submission gateway.

use async_trait::async_trait;
use std::time::Duration;

use fasal_core::gateway::PolicyGateway;
use fasal_core::models::{CreatePolicyRequest, Policy};
use fasal_core::types::FasalError;

use crate::error::ErrorResponse;
use crate::routes::{CREATE_POLICY_PATH, CreatePolicyResponse};

/// Network configuration for the gateway client.
#[derive(Debug, Clone, Default)]
pub struct NetworkConfig {
    /// Whole-request timeout. `None` waits indefinitely.
    pub timeout_seconds: Option<u64>,
}

/// [`PolicyGateway`] that posts to a running gateway server.
pub struct HttpPolicyGateway {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPolicyGateway {
    /// `base_url` is the server root, e.g. `http://localhost:5000`.
    pub fn new(base_url: &str, config: &NetworkConfig) -> Self {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Self {
            client: builder.build().unwrap_or_default(),
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), CREATE_POLICY_PATH),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PolicyGateway for HttpPolicyGateway {
    async fn create_policy(&self, request: &CreatePolicyRequest) -> Result<Policy, FasalError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| FasalError::NetworkError(format!("Gateway request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorResponse>().await {
                Ok(body) => body.error,
                Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
            };
            tracing::warn!(status = status.as_u16(), %message, "Gateway rejected policy");
            return Err(FasalError::GatewayError {
                status: status.as_u16(),
                message,
            });
        }

        let body: CreatePolicyResponse = response
            .json()
            .await
            .map_err(|e| FasalError::NetworkError(format!("Failed to parse gateway response: {}", e)))?;
        Ok(body.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_url() {
        let gateway = HttpPolicyGateway::new("http://localhost:5000/", &NetworkConfig::default());
        assert_eq!(gateway.endpoint(), "http://localhost:5000/api/policies/create");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let config = NetworkConfig {
            timeout_seconds: Some(2),
        };
        // Port 9 (discard) is not expected to run an HTTP server.
        let gateway = HttpPolicyGateway::new("http://127.0.0.1:9", &config);
        let request: CreatePolicyRequest = serde_json::from_value(serde_json::json!({
            "user_id": "7f1b3c4e-0000-4000-8000-000000000001",
            "state": "Punjab",
            "district": "Ludhiana",
            "crop": "Wheat",
            "premium_amount": 250,
            "coverage_amount": 10000,
            "start_date": "2025-06-01",
            "end_date": "2026-06-01",
            "status": "active"
        }))
        .unwrap();

        let err = gateway.create_policy(&request).await.unwrap_err();
        assert!(err.is_connectivity(), "{err:?}");
    }
}
