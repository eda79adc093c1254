//! Error taxonomy for the enhance pipeline.
//!
//! Every failure from the provider adapters and the request pipeline is one
//! of these variants. The engine turns each into exactly one notification
//! and one log line, then returns to idle.

use crate::llm::provider::Provider;
use thiserror::Error;

/// Category of a transport-level failure (no HTTP status was received).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    HostUnreachable,
    TimedOut,
    ConnectionLost,
    Offline,
    Other,
}

#[derive(Debug, Error)]
pub enum EnhanceError {
    #[error("API key missing. Please set your API key in Settings.")]
    MissingCredential,

    #[error("No text available. Copy text to your clipboard first, then try again.")]
    NoTextAvailable,

    #[error("Network unavailable. Please check your internet connection and try again.")]
    NetworkUnavailable,

    #[error("{message}")]
    Transport {
        kind: TransportKind,
        provider: Provider,
        message: String,
    },

    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("API Error: {message}")]
    ApiPayload { message: String },

    #[error("Failed to parse API response: {0}")]
    Parse(String),

    #[error("Could not place the result on the clipboard: {0}")]
    Clipboard(String),
}

impl EnhanceError {
    /// Build a transport error with the human-readable message for its kind.
    pub fn transport(kind: TransportKind, provider: Provider, detail: &str) -> Self {
        let message = match kind {
            TransportKind::HostUnreachable => format!(
                "Cannot connect to {} API server. Please check your internet connection and try again.",
                provider.display_name()
            ),
            TransportKind::TimedOut => {
                "Request timed out. The server is taking too long to respond.".to_string()
            }
            TransportKind::ConnectionLost => {
                "Network connection was lost. Please try again.".to_string()
            }
            TransportKind::Offline => {
                "No internet connection available. Please check your network settings.".to_string()
            }
            TransportKind::Other => format!("Request failed: {}", detail),
        };
        EnhanceError::Transport {
            kind,
            provider,
            message,
        }
    }

    /// Short title for the notification that reports this error.
    pub fn title(&self) -> &'static str {
        match self {
            EnhanceError::MissingCredential => "API Key Missing",
            EnhanceError::NoTextAvailable => "No Text Available",
            EnhanceError::NetworkUnavailable => "Network Unavailable",
            EnhanceError::Transport { .. } => "Connection Error",
            EnhanceError::Http { .. } | EnhanceError::ApiPayload { .. } => "API Error",
            EnhanceError::Parse(_) => "Unexpected Response",
            EnhanceError::Clipboard(_) => "Clipboard Error",
        }
    }

    /// Notification body. Drops the raw response body appended to HTTP errors.
    pub fn user_message(&self) -> String {
        let full = self.to_string();
        match full.split_once("\n\nDetailed error:") {
            Some((head, _)) => head.to_string(),
            None => full,
        }
    }

    /// Precondition failures never reach the network.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            EnhanceError::MissingCredential
                | EnhanceError::NoTextAvailable
                | EnhanceError::NetworkUnavailable
        )
    }
}
