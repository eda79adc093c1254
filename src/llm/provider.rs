//! LLM provider identity and the adapter interface.
//!
//! Two vendors are supported. Each one is a unit struct implementing
//! `ProviderAdapter`; `Provider::adapter()` selects it from configuration.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::anthropic::AnthropicAdapter;
use super::extract;
use super::models;
use super::openai::OpenAiAdapter;
use super::prompts::{self, MAX_TOKENS, TEMPERATURE};
use super::types::{ChatMessage, ChatRequest};
use crate::error::EnhanceError;

/// Vendor identity. Persisted in settings as `"openai"` / `"anthropic"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    #[serde(alias = "OpenAI")]
    OpenAi,
    #[serde(alias = "Anthropic")]
    Anthropic,
}

/// Provider metadata exposed to a settings panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
    pub endpoint: String,
    pub default_model: String,
    pub env_key: String,
}

impl Provider {
    pub fn all() -> [Provider; 2] {
        [Provider::OpenAi, Provider::Anthropic]
    }

    pub fn id(self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI",
            Provider::Anthropic => "Anthropic",
        }
    }

    pub fn endpoint(self) -> &'static str {
        match self {
            Provider::OpenAi => "https://api.openai.com/v1/chat/completions",
            Provider::Anthropic => "https://api.anthropic.com/v1/messages",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::OpenAi => models::OPENAI_DEFAULT_MODEL,
            Provider::Anthropic => models::ANTHROPIC_DEFAULT_MODEL,
        }
    }

    /// Environment variable that may supply this provider's API key.
    pub fn env_key(self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    /// Parse a loose user-supplied name ("OpenAI", "anthropic", "claude").
    pub fn from_name(name: &str) -> Option<Provider> {
        match name.trim().to_lowercase().as_str() {
            "openai" | "gpt" => Some(Provider::OpenAi),
            "anthropic" | "claude" => Some(Provider::Anthropic),
            _ => None,
        }
    }

    pub fn info(self) -> ProviderInfo {
        ProviderInfo {
            id: self.id().to_string(),
            name: self.display_name().to_string(),
            endpoint: self.endpoint().to_string(),
            default_model: self.default_model().to_string(),
            env_key: self.env_key().to_string(),
        }
    }

    pub fn adapter(self) -> &'static dyn ProviderAdapter {
        match self {
            Provider::OpenAi => &OpenAiAdapter,
            Provider::Anthropic => &AnthropicAdapter,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Per-vendor request construction and response parsing.
///
/// Implementors supply the vendor-specific pieces (headers, model aliases,
/// success payload shapes). Body construction and the layered extraction
/// fallback are shared default methods.
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> Provider;

    /// Full header set for a request authenticated with `api_key`.
    fn headers(&self, api_key: &str) -> Vec<(String, String)>;

    /// Best-effort alias mapping. Unknown names pass through unchanged.
    fn normalize_model(&self, requested: &str) -> String;

    /// Current success payload shape.
    fn extract_primary(&self, json: &Value) -> Option<String>;

    /// Older API generation's success payload shape.
    fn extract_legacy(&self, json: &Value) -> Option<String>;

    /// Model to send: the override when non-blank, else the vendor default,
    /// then normalised.
    fn resolve_model(&self, model_override: Option<&str>) -> String {
        let requested = model_override
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.provider().default_model());
        self.normalize_model(requested)
    }

    fn build_request(
        &self,
        prompt_text: &str,
        user_text: &str,
        model_override: Option<&str>,
    ) -> ChatRequest {
        ChatRequest {
            model: self.resolve_model(model_override),
            messages: vec![ChatMessage::user(prompts::build_user_content(
                prompt_text,
                user_text,
            ))],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        }
    }

    fn extract_response(&self, body: &[u8]) -> Result<String, EnhanceError> {
        extract::extract_layered(self, body)
    }
}
