//! LLM domain: provider adapters and the HTTP exchange.
//!
//! Providers:
//!   - OpenAI chat completions (openai.rs)
//!   - Anthropic Messages (anthropic.rs)
//!
//! Shared:
//!   - provider.rs  `Provider` enum, metadata, `ProviderAdapter` trait
//!   - extract.rs  layered response extraction
//!   - http.rs  transport seam + reqwest implementation
//!   - models.rs  model-name normalisation
//!   - prompts.rs  prompt framing and sampling constants

mod anthropic;
pub mod extract;
pub mod http;
pub mod models;
mod openai;
pub mod prompts;
pub mod provider;
pub mod types;

pub use anthropic::AnthropicAdapter;
pub use http::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportFailure};
pub use openai::OpenAiAdapter;
pub use provider::{Provider, ProviderAdapter, ProviderInfo};
pub use types::{ChatMessage, ChatRequest};
