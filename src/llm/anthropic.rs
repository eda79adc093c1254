//! Anthropic Messages API adapter.
//!
//! Key differences from OpenAI:
//! - API key in `x-api-key`, plus a fixed `anthropic-version` header
//! - Text in `content[0].text`
//! - Legacy completions API: top-level `completion`

use serde_json::Value;

use super::models;
use super::provider::{Provider, ProviderAdapter};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicAdapter;

impl ProviderAdapter for AnthropicAdapter {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    fn headers(&self, api_key: &str) -> Vec<(String, String)> {
        vec![
            ("content-type".to_string(), "application/json".to_string()),
            ("anthropic-version".to_string(), ANTHROPIC_VERSION.to_string()),
            ("x-api-key".to_string(), api_key.to_string()),
        ]
    }

    fn normalize_model(&self, requested: &str) -> String {
        models::normalize_anthropic(requested)
    }

    fn extract_primary(&self, json: &Value) -> Option<String> {
        json.get("content")?
            .get(0)?
            .get("text")?
            .as_str()
            .map(|s| s.to_string())
    }

    fn extract_legacy(&self, json: &Value) -> Option<String> {
        json.get("completion")?.as_str().map(|s| s.to_string())
    }
}
