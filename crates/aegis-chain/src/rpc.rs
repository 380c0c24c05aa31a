//! Minimal Ethereum JSON-RPC transport over reqwest

use crate::error::{Error, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// JSON-RPC client for one endpoint
pub struct JsonRpcClient {
    client: Client,
    url: String,
    timeout: Duration,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    /// Create a client for `url`
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(Error::NotConfigured("rpc_url is empty".to_string()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::NotConfigured(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url,
            timeout,
            next_id: AtomicU64::new(1),
        })
    }

    /// Endpoint URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Call `method` and deserialize its `result`. A `null` result is
    /// returned as `None`.
    #[instrument(skip(self, params))]
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<Option<T>> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        debug!("Sending rpc request");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(self.timeout.as_millis() as u64)
                } else {
                    Error::Network(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(Error::Network(format!(
                "rpc endpoint returned HTTP {}",
                response.status()
            )));
        }

        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;
        decode_envelope(envelope)
    }
}

fn decode_envelope<T: DeserializeOwned>(envelope: RpcResponse) -> Result<Option<T>> {
    if let Some(error) = envelope.error {
        return Err(Error::Rpc {
            code: error.code,
            message: error.message,
        });
    }
    match envelope.result {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| Error::InvalidResponse(e.to_string())),
    }
}

/// Parse a hex quantity such as `"0x1b4"`
pub fn parse_quantity(value: &str) -> Result<u64> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| Error::InvalidResponse(format!("quantity {} lacks 0x prefix", value)))?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| Error::InvalidResponse(format!("quantity {}: {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(value: Value) -> RpcResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_result_is_decoded() {
        let out: Option<String> =
            decode_envelope(envelope(json!({ "jsonrpc": "2.0", "id": 1, "result": "0x01" }))).unwrap();
        assert_eq!(out.as_deref(), Some("0x01"));
    }

    #[test]
    fn test_null_result_is_none() {
        let out: Option<String> =
            decode_envelope(envelope(json!({ "jsonrpc": "2.0", "id": 1, "result": null }))).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_error_object_wins() {
        let err = decode_envelope::<String>(envelope(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": 3, "message": "execution reverted" }
        })))
        .unwrap_err();
        assert!(err.is_revert());
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x1b4").unwrap(), 436);
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert!(parse_quantity("12").is_err());
        assert!(parse_quantity("0xzz").is_err());
    }

    #[test]
    fn test_empty_url_rejected() {
        assert!(JsonRpcClient::new("", Duration::from_secs(1)).is_err());
    }
}
