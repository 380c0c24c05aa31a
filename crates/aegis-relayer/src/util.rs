//! Common utilities for the relayer client
//!
//! Masking and sanitizing helpers that keep secrets out of logs and errors.

use regex::Regex;
use std::sync::LazyLock;

/// Minimum key length to display partial key
const MIN_KEY_LENGTH_FOR_PARTIAL_DISPLAY: usize = 8;

/// Number of characters to show at start/end of masked key
const KEY_MASK_VISIBLE_CHARS: usize = 4;

/// Longest relayer error body passed through
const MAX_ERROR_LEN: usize = 200;

/// Patterns that make an error body unsafe to surface
const SENSITIVE_PATTERNS: &[&str] = &[
    "api_key",
    "api-key",
    "authorization",
    "bearer",
    "secret",
    "password",
    "private key",
];

/// 32-byte hex values; account codes look like this
static HEX_32: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(0x)?[0-9a-fA-F]{64}").expect("static regex"));

/// Mask API key for safe display in logs
///
/// # Examples
/// ```
/// use aegis_relayer::util::mask_api_key;
/// assert_eq!(mask_api_key("rk-1234567890abcdef"), "rk-1...cdef");
/// assert_eq!(mask_api_key("short"), "****");
/// ```
#[must_use]
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= MIN_KEY_LENGTH_FOR_PARTIAL_DISPLAY {
        return "****".to_string();
    }
    let head: String = chars[..KEY_MASK_VISIBLE_CHARS].iter().collect();
    let tail: String = chars[chars.len() - KEY_MASK_VISIBLE_CHARS..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Sanitize a relayer error body before it becomes part of an error.
///
/// 32-byte hex values are redacted because the relayer may echo the
/// account code. Bodies mentioning credentials are replaced entirely.
#[must_use]
pub fn sanitize_relayer_error(body: &str) -> String {
    let lower = body.to_lowercase();
    if SENSITIVE_PATTERNS.iter().any(|p| lower.contains(p)) {
        return "relayer returned an error that referenced credentials".to_string();
    }

    let redacted = HEX_32.replace_all(body.trim(), "[REDACTED]");
    if redacted.chars().count() > MAX_ERROR_LEN {
        let truncated: String = redacted.chars().take(MAX_ERROR_LEN).collect();
        return format!("{}...", truncated);
    }
    redacted.into_owned()
}

/// Join a base URL and an endpoint path with exactly one slash
#[must_use]
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
