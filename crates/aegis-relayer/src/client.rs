//! HTTP relayer client
//!
//! Talks to an email-auth relayer over HTTP+JSON:
//! - `POST /getAccountSalt`
//! - `POST /acceptanceRequest`
//! - `POST /recoveryRequest`
//! - `POST /completeRequest`
//!
//! Responses are returned as raw JSON; `aegis-core` validates their shape.
//! Nothing is retried here.

use crate::error::{Error, Result};
use crate::util::{endpoint_url, mask_api_key, sanitize_relayer_error};
use aegis_core::gateway::{
    AcceptanceRequest, AccountSaltRequest, CompleteRequest, RecoveryRequestBody, RelayerGateway,
};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default relayer request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Relayer client configuration
#[derive(Clone)]
pub struct RelayerConfig {
    /// Base URL, e.g. `https://auth-base-sepolia-staging.prove.email/api`
    pub base_url: String,
    /// Optional bearer token
    pub api_key: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

// SECURITY: Custom Debug implementation to mask API key
impl fmt::Debug for RelayerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayerConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_deref().map(mask_api_key))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RelayerConfig {
    /// Create a configuration for a relayer base URL
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("AEGIS_RELAYER_URL")
            .map_err(|_| Error::NotConfigured("AEGIS_RELAYER_URL not set".to_string()))?;

        let mut config = Self::new(base_url);
        if let Ok(key) = std::env::var("AEGIS_RELAYER_API_KEY") {
            config = config.with_api_key(key);
        }
        Ok(config)
    }

    /// Set the bearer token
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Relayer gateway over HTTP
pub struct HttpRelayer {
    client: Client,
    config: RelayerConfig,
}

impl HttpRelayer {
    /// Create a new relayer client
    pub fn new(config: RelayerConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(Error::NotConfigured("relayer base_url is empty".to_string()));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::NotConfigured(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(RelayerConfig::from_env()?)
    }

    /// Client configuration
    #[must_use]
    pub fn config(&self) -> &RelayerConfig {
        &self.config
    }

    #[instrument(skip(self, body), fields(base_url = %self.config.base_url))]
    async fn post<B: Serialize + Sync + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        let url = endpoint_url(&self.config.base_url, path);
        debug!("Sending relayer request");

        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(self.config.timeout.as_millis() as u64)
            } else {
                Error::Network(sanitize_relayer_error(&e.to_string()))
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Network(sanitize_relayer_error(&e.to_string())))?;

        // request timeout and rate limiting are worth retrying later
        if status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::TOO_MANY_REQUESTS {
            warn!(status = status.as_u16(), "relayer asked to retry later");
            return Err(Error::Server {
                status: status.as_u16(),
                message: sanitize_relayer_error(&text),
            });
        }
        if status.is_client_error() {
            warn!(status = status.as_u16(), "relayer rejected request");
            return Err(Error::Rejected {
                status: status.as_u16(),
                message: sanitize_relayer_error(&text),
            });
        }
        if !status.is_success() {
            return Err(Error::Server {
                status: status.as_u16(),
                message: sanitize_relayer_error(&text),
            });
        }

        parse_body(&text)
    }
}

/// Parse a success body. Some relayer builds answer `/getAccountSalt` with
/// an unquoted hex string, which is accepted as a JSON string.
fn parse_body(text: &str) -> Result<Value> {
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(e) => {
            let trimmed = text.trim();
            if trimmed.starts_with("0x") && trimmed.chars().skip(2).all(|c| c.is_ascii_hexdigit()) {
                Ok(Value::String(trimmed.to_string()))
            } else {
                Err(Error::InvalidResponse(format!("body is not JSON: {}", e)))
            }
        }
    }
}

#[async_trait::async_trait]
impl RelayerGateway for HttpRelayer {
    async fn get_account_salt(&self, request: AccountSaltRequest) -> aegis_core::Result<Value> {
        Ok(self.post("getAccountSalt", &request).await?)
    }

    async fn acceptance_request(&self, request: AcceptanceRequest) -> aegis_core::Result<Value> {
        Ok(self.post("acceptanceRequest", &request).await?)
    }

    async fn recovery_request(&self, request: RecoveryRequestBody) -> aegis_core::Result<Value> {
        Ok(self.post("recoveryRequest", &request).await?)
    }

    async fn complete_request(&self, request: CompleteRequest) -> aegis_core::Result<Value> {
        Ok(self.post("completeRequest", &request).await?)
    }
}
