//! OpenAI chat-completions adapter.
//!
//! - Bearer token in the `authorization` header
//! - Text in `choices[0].message.content`
//! - Legacy completions API: `choices[0].text`

use serde_json::Value;

use super::models;
use super::provider::{Provider, ProviderAdapter};

pub struct OpenAiAdapter;

impl ProviderAdapter for OpenAiAdapter {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    fn headers(&self, api_key: &str) -> Vec<(String, String)> {
        vec![
            ("content-type".to_string(), "application/json".to_string()),
            ("authorization".to_string(), format!("Bearer {}", api_key)),
        ]
    }

    fn normalize_model(&self, requested: &str) -> String {
        models::normalize_openai(requested)
    }

    fn extract_primary(&self, json: &Value) -> Option<String> {
        json.get("choices")?
            .get(0)?
            .get("message")?
            .get("content")?
            .as_str()
            .map(|s| s.to_string())
    }

    fn extract_legacy(&self, json: &Value) -> Option<String> {
        json.get("choices")?
            .get(0)?
            .get("text")?
            .as_str()
            .map(|s| s.to_string())
    }
}
