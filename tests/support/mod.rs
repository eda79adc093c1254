//! Shared fakes for the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use textlift_lib::credentials::CredentialResolver;
use textlift_lib::llm::{HttpRequest, HttpResponse, HttpTransport, Provider, TransportFailure};
use textlift_lib::pipeline::RequestPipeline;
use textlift_lib::platform::{Notification, Notifier, StaticProbe};
use textlift_lib::settings::{Settings, SharedSettings};

/// Replays canned responses and records every request it receives.
#[derive(Default)]
pub struct FakeTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportFailure>>>,
    requests: Mutex<Vec<HttpRequest>>,
    delay: Option<Duration>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps this long before answering.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn respond(&self, status: u16, body: &str) {
        self.responses.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            body: body.as_bytes().to_vec(),
        }));
    }

    pub fn fail(&self, failure: TransportFailure) {
        self.responses.lock().unwrap().push_back(Err(failure));
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, TransportFailure> {
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("FakeTransport: no response queued"))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn titles(&self) -> Vec<String> {
        self.seen.lock().unwrap().iter().map(|n| n.title.clone()).collect()
    }

    pub fn all(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        eprintln!("[TEST] notify: {} / {}", notification.title, notification.body);
        self.seen.lock().unwrap().push(notification);
    }
}

pub fn settings_for(provider: Provider, api_key: &str) -> SharedSettings {
    SharedSettings::in_memory(Settings {
        provider,
        api_key: api_key.to_string(),
        ..Settings::default()
    })
}

pub fn pipeline_with(
    settings: SharedSettings,
    transport: Arc<FakeTransport>,
    online: bool,
) -> RequestPipeline {
    RequestPipeline::new(
        settings,
        transport,
        Arc::new(StaticProbe(online)),
        CredentialResolver::settings_only(),
    )
}
