//! Request pipeline: captured text → provider call → enhanced text.
//!
//! process(): network check → credential → text → build request →
//! POST (60 s timeout) → classify status → extract. One call per
//! invocation; failures are terminal and never retried here.

use std::sync::Arc;
use std::time::Instant;

use crate::credentials::CredentialResolver;
use crate::error::EnhanceError;
use crate::llm::http::REQUEST_TIMEOUT;
use crate::llm::prompts::frame_prompt;
use crate::llm::{HttpRequest, HttpResponse, HttpTransport, Provider};
use crate::platform::NetworkProbe;
use crate::settings::{Settings, SharedSettings};

const CONNECTION_TEST_PROMPT: &str = "Reply with the single word OK.";
const CONNECTION_TEST_TEXT: &str = "ping";

/// Everything one provider call needs, rebuilt from settings every time.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub provider: Provider,
    pub api_key: String,
    pub model_override: Option<String>,
    /// Framed prompt text, as sent.
    pub prompt_text: String,
    pub user_text: String,
}

impl RequestConfig {
    pub fn from_settings(
        settings: &Settings,
        credentials: &CredentialResolver,
        user_text: &str,
    ) -> Result<Self, EnhanceError> {
        let provider = settings.provider;
        let (api_key, source) = credentials
            .resolve(provider, &settings.api_key)
            .ok_or(EnhanceError::MissingCredential)?;
        log::debug!("[PIPELINE] Using {} key from {:?}", provider, source);

        if user_text.trim().is_empty() {
            return Err(EnhanceError::NoTextAvailable);
        }

        Ok(Self {
            provider,
            api_key,
            model_override: settings.model_override().map(str::to_string),
            prompt_text: frame_prompt(&settings.selected_prompt().text),
            user_text: user_text.to_string(),
        })
    }
}

pub struct RequestPipeline {
    settings: SharedSettings,
    transport: Arc<dyn HttpTransport>,
    network: Arc<dyn NetworkProbe>,
    credentials: CredentialResolver,
}

impl RequestPipeline {
    pub fn new(
        settings: SharedSettings,
        transport: Arc<dyn HttpTransport>,
        network: Arc<dyn NetworkProbe>,
        credentials: CredentialResolver,
    ) -> Self {
        Self {
            settings,
            transport,
            network,
            credentials,
        }
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    /// Enhance `captured_text` with the selected prompt and provider.
    pub async fn process(&self, captured_text: &str) -> Result<String, EnhanceError> {
        if !self.network.is_reachable() {
            return Err(EnhanceError::NetworkUnavailable);
        }
        let settings = self.settings.snapshot();
        let config = RequestConfig::from_settings(&settings, &self.credentials, captured_text)?;
        self.execute(&config).await
    }

    /// Send a tiny request with the current provider, key and model.
    pub async fn test_connection(&self) -> Result<String, EnhanceError> {
        if !self.network.is_reachable() {
            return Err(EnhanceError::NetworkUnavailable);
        }
        let settings = self.settings.snapshot();
        let mut config =
            RequestConfig::from_settings(&settings, &self.credentials, CONNECTION_TEST_TEXT)?;
        config.prompt_text = CONNECTION_TEST_PROMPT.to_string();
        let reply = self.execute(&config).await?;
        log::info!("[PIPELINE] Connection test to {} succeeded", config.provider);
        Ok(reply)
    }

    async fn execute(&self, config: &RequestConfig) -> Result<String, EnhanceError> {
        let adapter = config.provider.adapter();
        let request = adapter.build_request(
            &config.prompt_text,
            &config.user_text,
            config.model_override.as_deref(),
        );
        let body = request
            .to_json_bytes()
            .map_err(|e| EnhanceError::Parse(format!("Failed to encode request: {}", e)))?;

        log::info!(
            "[PIPELINE] Sending {} chars to {} (model: {})",
            config.user_text.len(),
            config.provider,
            request.model
        );
        let start = Instant::now();
        let response = self
            .transport
            .post(HttpRequest {
                url: config.provider.endpoint().to_string(),
                headers: adapter.headers(&config.api_key),
                body,
                timeout: REQUEST_TIMEOUT,
            })
            .await
            .map_err(|f| EnhanceError::transport(f.kind, config.provider, &f.detail))?;
        log::info!(
            "[PIPELINE] {} responded {} in {}ms",
            config.provider,
            response.status,
            start.elapsed().as_millis()
        );

        if !response.is_success() {
            return Err(classify_http_error(config.provider, &response));
        }
        adapter.extract_response(&response.body)
    }
}

/// Turn a non-2xx response into `EnhanceError::Http` with a status-specific
/// message, the vendor's `error.message` when present, and the raw body.
pub fn classify_http_error(provider: Provider, response: &HttpResponse) -> EnhanceError {
    let status = response.status;
    let mut message = match status {
        401 => "Authentication failed. Please check your API key.".to_string(),
        403 => "Access denied. Your API key may not have permission to use this model.".to_string(),
        404 => "API endpoint not found. The API may have changed.".to_string(),
        429 => "Rate limit exceeded. Please try again later.".to_string(),
        500..=599 => format!("{} server error. Please try again later.", provider.display_name()),
        _ => format!("API server error (Status {})", status),
    };

    let body = response.body_text();
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(&body) {
        let vendor_message = json
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
            .map(str::to_string);
        if let Some(vendor_message) = vendor_message {
            message.push_str(&format!(" (API Error: {})", vendor_message));
        }
    }
    if !body.trim().is_empty() {
        message.push_str(&format!("\n\nDetailed error: {}", body));
    }

    EnhanceError::Http { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            body: body.as_bytes().to_vec(),
        }
    }

    fn message(err: EnhanceError) -> (u16, String) {
        match err {
            EnhanceError::Http { status, message } => (status, message),
            other => panic!("expected Http error, got {:?}", other),
        }
    }

    #[test]
    fn status_codes_get_specific_messages() {
        let cases = [
            (401, "Authentication failed"),
            (403, "Access denied"),
            (404, "endpoint not found"),
            (429, "Rate limit exceeded"),
            (503, "Anthropic server error"),
            (418, "API server error (Status 418)"),
        ];
        for (status, needle) in cases {
            let (got, msg) = message(classify_http_error(Provider::Anthropic, &response(status, "")));
            assert_eq!(got, status);
            assert!(msg.contains(needle), "{}: {}", status, msg);
            assert!(!msg.contains("Detailed error"));
        }
    }

    #[test]
    fn vendor_message_and_body_are_appended() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        let (_, msg) = message(classify_http_error(Provider::OpenAi, &response(401, body)));
        assert!(msg.starts_with("Authentication failed."));
        assert!(msg.contains("(API Error: Incorrect API key provided)"));
        assert!(msg.ends_with(&format!("Detailed error: {}", body)));
    }

    #[test]
    fn non_json_error_body_is_still_appended() {
        let (_, msg) = message(classify_http_error(
            Provider::OpenAi,
            &response(502, "<html>Bad Gateway</html>"),
        ));
        assert!(msg.contains("OpenAI server error"));
        assert!(!msg.contains("(API Error"));
        assert!(msg.contains("<html>Bad Gateway</html>"));
    }

    #[test]
    fn config_frames_the_selected_prompt() {
        let mut settings = Settings::default();
        settings.api_key = "sk-test".into();
        settings.custom_model = "gpt4".into();
        let config =
            RequestConfig::from_settings(&settings, &CredentialResolver::settings_only(), "hi")
                .unwrap();
        assert!(config.prompt_text.starts_with(&settings.selected_prompt().text));
        assert!(config.prompt_text.contains("CRITICAL INSTRUCTION"));
        assert_eq!(config.model_override.as_deref(), Some("gpt4"));
    }

    #[test]
    fn config_checks_credential_before_text() {
        let settings = Settings::default();
        let err = RequestConfig::from_settings(&settings, &CredentialResolver::settings_only(), "")
            .unwrap_err();
        assert!(matches!(err, EnhanceError::MissingCredential));
    }
}
