//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use avatax_core::{
    AuditSink, AvaTaxClient, ClientConfig, Credentials, Environment, HttpRequest, HttpResponse,
    LogLevel, LogOptions, Transport, TransportError,
};

/// Audit sink that keeps every line in memory.
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl MemorySink {
    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.lock().unwrap().clone()
    }

    pub fn only(&self) -> (LogLevel, String) {
        let lines = self.lines();
        assert_eq!(lines.len(), 1, "expected exactly one audit line, got {lines:?}");
        lines.into_iter().next().unwrap()
    }
}

impl AuditSink for MemorySink {
    fn info(&self, line: &str) {
        self.lines.lock().unwrap().push((LogLevel::Info, line.to_string()));
    }

    fn error(&self, line: &str) {
        self.lines.lock().unwrap().push((LogLevel::Error, line.to_string()));
    }
}

/// Transport that answers every request with a canned response after an
/// optional delay, recording what it was sent.
pub struct ScriptedTransport {
    response: Option<HttpResponse>,
    delay: Duration,
    pub sent: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn respond(content_type: &str, status: u16, body: &str) -> Self {
        let mut headers = vec![("content-type".to_string(), content_type.to_string())];
        if body.is_empty() {
            headers.push(("content-length".to_string(), "0".to_string()));
        }
        Self::with_response(HttpResponse {
            status,
            headers,
            body: body.as_bytes().to_vec(),
        })
    }

    pub fn with_response(response: HttpResponse) -> Self {
        Self {
            response: Some(response),
            delay: Duration::ZERO,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Never answers.
    pub fn hang() -> Self {
        Self {
            response: None,
            delay: Duration::ZERO,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn last_request(&self) -> HttpRequest {
        self.sent.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.sent.lock().unwrap().push(request);
        tokio::time::sleep(self.delay).await;
        match &self.response {
            Some(response) => Ok(response.clone()),
            None => std::future::pending().await,
        }
    }
}

/// Client wired to `transport` and `sink`, pointed at a dummy base URL.
pub fn client(
    transport: Arc<dyn Transport>,
    sink: Arc<MemorySink>,
    configure: impl FnOnce(avatax_core::ClientConfigBuilder) -> avatax_core::ClientConfigBuilder,
) -> AvaTaxClient {
    let builder = ClientConfig::builder("IntegrationTests", "1.0", "ci-runner")
        .environment(Environment::Custom("http://tax.test".to_string()))
        .credentials(Credentials::account("1100012345", "LICENSEKEY"))
        .transport(transport)
        .logging(LogOptions::with_sink(sink));
    AvaTaxClient::new(configure(builder).build().unwrap())
}
