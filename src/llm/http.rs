//! HTTP transport seam.
//!
//! The pipeline talks to `HttpTransport` rather than reqwest directly so the
//! exchange can be replaced in tests. `ReqwestTransport` is the real one.
//! Transport failures are classified into `TransportKind` here, close to the
//! client library that produced them.

use std::error::Error as StdError;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportKind;

/// Client-side timeout for every provider call. The only cancellation path.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

/// A request that never produced an HTTP status.
#[derive(Debug, Clone)]
pub struct TransportFailure {
    pub kind: TransportKind,
    pub detail: String,
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, TransportFailure>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, TransportFailure> {
        let mut builder = self
            .client
            .post(&request.url)
            .timeout(request.timeout)
            .body(request.body);
        for (k, v) in &request.headers {
            builder = builder.header(k.as_str(), v.as_str());
        }

        let resp = builder.send().await.map_err(|e| failure_from_reqwest(&e))?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(|e| failure_from_reqwest(&e))?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn failure_from_reqwest(err: &reqwest::Error) -> TransportFailure {
    let kind = classify_reqwest_error(err);
    log::debug!("[HTTP] Transport failure ({:?}): {}", kind, err);
    TransportFailure {
        kind,
        detail: err.to_string(),
    }
}

/// Map a reqwest error onto a transport category by walking its source chain.
pub fn classify_reqwest_error(err: &reqwest::Error) -> TransportKind {
    if err.is_timeout() {
        return TransportKind::TimedOut;
    }

    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            if let Some(kind) = classify_io_error(io) {
                return kind;
            }
        }
        if let Some(kind) = classify_message(&cause.to_string()) {
            return kind;
        }
        source = cause.source();
    }

    if err.is_connect() {
        return TransportKind::HostUnreachable;
    }
    TransportKind::Other
}

pub fn classify_io_error(err: &std::io::Error) -> Option<TransportKind> {
    use std::io::ErrorKind;
    match err.kind() {
        ErrorKind::TimedOut => Some(TransportKind::TimedOut),
        ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::BrokenPipe
        | ErrorKind::UnexpectedEof => Some(TransportKind::ConnectionLost),
        ErrorKind::ConnectionRefused | ErrorKind::AddrNotAvailable => {
            Some(TransportKind::HostUnreachable)
        }
        ErrorKind::NotConnected => Some(TransportKind::Offline),
        _ => classify_message(&err.to_string()),
    }
}

/// Fallback for causes that only expose a message (resolver errors, OS text).
fn classify_message(message: &str) -> Option<TransportKind> {
    let lower = message.to_lowercase();
    if lower.contains("network is unreachable") || lower.contains("no route to host") {
        Some(TransportKind::Offline)
    } else if lower.contains("dns error")
        || lower.contains("failed to lookup address")
        || lower.contains("name or service not known")
        || lower.contains("nodename nor servname")
    {
        Some(TransportKind::HostUnreachable)
    } else if lower.contains("connection reset") || lower.contains("connection closed") {
        Some(TransportKind::ConnectionLost)
    } else {
        None
    }
}
