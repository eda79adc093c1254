//! Layered response extraction.
//!
//! Vendor payloads change field names across API versions, so extraction
//! degrades step by step instead of failing on the first mismatch:
//!
//! 1. the adapter's current success shape
//! 2. the adapter's legacy success shape
//! 3. an explicit `error` object (`message`, `msg` or `type`)
//! 4. the raw body: an error if it mentions "error", otherwise the text itself
//!
//! Only bytes that are not JSON at all produce `EnhanceError::Parse`.

use serde_json::Value;

use super::provider::ProviderAdapter;
use crate::error::EnhanceError;

pub fn extract_layered<A: ProviderAdapter + ?Sized>(
    adapter: &A,
    body: &[u8],
) -> Result<String, EnhanceError> {
    let json: Value = serde_json::from_slice(body).map_err(|e| {
        log::warn!("[LLM] Response is not JSON: {}", e);
        EnhanceError::Parse(e.to_string())
    })?;

    if let Some(text) = adapter.extract_primary(&json) {
        return Ok(text);
    }
    if let Some(text) = adapter.extract_legacy(&json) {
        log::info!("[LLM] {} response matched legacy shape", adapter.provider());
        return Ok(text);
    }
    if let Some(message) = error_object_message(&json) {
        return Err(EnhanceError::ApiPayload { message });
    }

    let raw = String::from_utf8_lossy(body).to_string();
    log::warn!(
        "[LLM] Unrecognised {} payload: {}",
        adapter.provider(),
        raw.chars().take(200).collect::<String>()
    );
    if raw.contains("error") {
        Err(EnhanceError::ApiPayload { message: raw })
    } else {
        Ok(raw)
    }
}

/// Human-readable message from an `{"error": {...}}` object, if present.
pub fn error_object_message(json: &Value) -> Option<String> {
    let error = json.get("error")?.as_object()?;
    let message = if let Some(m) = error.get("message").and_then(Value::as_str) {
        m.to_string()
    } else if let Some(m) = error.get("msg").and_then(Value::as_str) {
        m.to_string()
    } else if let Some(t) = error.get("type").and_then(Value::as_str) {
        format!("Error type: {}", t)
    } else {
        "API Error".to_string()
    };
    Some(message)
}
