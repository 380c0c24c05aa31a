//! Relayer response schemas
//!
//! Each relayer response is decoded into a typed value here. A payload that
//! does not match is a [`Error::Validation`] and is never coerced.

use crate::error::{Error, Result};
use crate::types::{GuardianSalt, RequestId};
use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// Acknowledgement returned by `/completeRequest`. Contents are opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionAck(pub Map<String, Value>);

/// Decode a `/getAccountSalt` response.
///
/// The relayer answers either with the bare hex string or with
/// `{"guardianSalt": "0x…"}`.
pub fn decode_account_salt(body: &Value) -> Result<GuardianSalt> {
    let raw = match body {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map
            .get("guardianSalt")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Validation("getAccountSalt: missing guardianSalt".to_string()))?,
        other => {
            return Err(Error::Validation(format!(
                "getAccountSalt: expected string or object, got {}",
                type_name(other)
            )))
        }
    };

    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    if digits.len() != 64 {
        return Err(Error::Validation(format!(
            "getAccountSalt: salt must be 32 bytes, got {} hex digits",
            digits.len()
        )));
    }
    B256::from_str(digits)
        .map(GuardianSalt)
        .map_err(|e| Error::Validation(format!("getAccountSalt: {}", e)))
}

/// Decode the `{requestId}` object returned by the acceptance and recovery endpoints.
pub fn decode_request_id(endpoint: &str, body: &Value) -> Result<RequestId> {
    let map = body.as_object().ok_or_else(|| {
        Error::Validation(format!(
            "{}: expected object, got {}",
            endpoint,
            type_name(body)
        ))
    })?;

    match map.get("requestId") {
        Some(Value::String(id)) if !id.trim().is_empty() => Ok(RequestId(id.clone())),
        Some(Value::Number(n)) if n.is_u64() => Ok(RequestId(n.to_string())),
        Some(other) => Err(Error::Validation(format!(
            "{}: requestId must be a non-empty string or unsigned integer, got {}",
            endpoint,
            type_name(other)
        ))),
        None => Err(Error::Validation(format!("{}: missing requestId", endpoint))),
    }
}

/// Decode the `/completeRequest` acknowledgement.
pub fn decode_completion_ack(body: &Value) -> Result<CompletionAck> {
    match body {
        Value::Object(map) => Ok(CompletionAck(map.clone())),
        other => Err(Error::Validation(format!(
            "completeRequest: expected object, got {}",
            type_name(other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
