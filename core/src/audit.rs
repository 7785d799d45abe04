//! Per-call audit log entry.
//!
//! # Design
//! One `AuditLogEntry` is created when a call starts and is filled in as the
//! call progresses: request info before sending, elapsed time when the
//! transport returns, then either response info or error info. `flush`
//! consumes the entry, so it can reach the sink at most once, and nothing is
//! written to the sink before that point. Fields that were never populated
//! are left out of the rendered line.

use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::http::{HttpRequest, HttpResponse, RequestBody};
use crate::logger::AuditSink;

/// Longest payload or body rendered into an audit line, in characters.
pub const MAX_LOGGED_BODY: usize = 1000;

const REDACTED: &str = "<redacted>";

/// Severity an entry is flushed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

#[derive(Debug)]
pub struct AuditLogEntry {
    started_at: DateTime<Utc>,
    clock: Instant,
    request_url: Option<String>,
    verb: Option<String>,
    request_headers: Vec<(String, String)>,
    request_payload: Option<String>,
    elapsed: Option<Duration>,
    response_status: Option<u16>,
    response_body: Option<String>,
    error: Option<String>,
}

impl Default for AuditLogEntry {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditLogEntry {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            clock: Instant::now(),
            request_url: None,
            verb: None,
            request_headers: Vec::new(),
            request_payload: None,
            elapsed: None,
            response_status: None,
            response_body: None,
            error: None,
        }
    }

    /// Capture the outgoing request. Credentials are never recorded.
    pub fn populate_request_info(&mut self, request: &HttpRequest) {
        self.request_url = Some(request.url.clone());
        self.verb = Some(request.method.to_string());
        self.request_headers = request
            .headers
            .iter()
            .map(|(name, value)| {
                let value = if name.eq_ignore_ascii_case("authorization") {
                    REDACTED.to_string()
                } else {
                    value.clone()
                };
                (name.clone(), value)
            })
            .collect();
        self.request_payload = request.body.as_ref().map(|body| match body {
            RequestBody::Json(text) => summarize(text),
            RequestBody::Multipart { field, content } => {
                format!("multipart field {field:?} ({} bytes)", content.len())
            }
        });
    }

    /// Record the time between creation and now. Only the first call counts.
    pub fn populate_elapsed_time(&mut self) {
        if self.elapsed.is_none() {
            self.elapsed = Some(self.clock.elapsed());
        }
    }

    /// Capture a successfully processed response.
    pub fn populate_response_info(&mut self, response: &HttpResponse, decoded: Option<&str>) {
        self.response_status = Some(response.status);
        self.response_body = decoded.map(summarize);
    }

    /// Capture a failure. `response` is absent when none was received.
    pub fn populate_error_info(&mut self, response: Option<&HttpResponse>, error: &dyn fmt::Display) {
        if let Some(response) = response {
            self.response_status = Some(response.status);
            if let Ok(text) = response.text() {
                if !text.is_empty() {
                    self.response_body = Some(summarize(text));
                }
            }
        }
        self.error = Some(error.to_string());
    }

    /// Last known response status.
    pub fn status_code(&self) -> Option<u16> {
        self.response_status
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed
    }

    /// Error when a failure was recorded or the status is above 299.
    pub fn level(&self) -> LogLevel {
        if self.error.is_some() {
            return LogLevel::Error;
        }
        match self.response_status {
            Some(status) if status > 299 => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }

    /// Hand the rendered entry to `sink` and discard it.
    pub fn flush(self, sink: Option<&dyn AuditSink>) {
        let Some(sink) = sink else {
            return;
        };
        let line = self.to_string();
        match self.level() {
            LogLevel::Info => sink.info(&line),
            LogLevel::Error => sink.error(&line),
        }
    }
}

impl fmt::Display for AuditLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}]",
            self.started_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        )?;
        if let Some(verb) = &self.verb {
            write!(f, " {verb}")?;
        }
        if let Some(url) = &self.request_url {
            write!(f, " {url}")?;
        }
        if let Some(status) = self.response_status {
            write!(f, " status={status}")?;
        }
        if let Some(elapsed) = self.elapsed {
            write!(f, " elapsed={}ms", elapsed.as_millis())?;
        }
        if !self.request_headers.is_empty() {
            let headers: Vec<String> = self
                .request_headers
                .iter()
                .map(|(name, value)| format!("{name}: {value}"))
                .collect();
            write!(f, " headers={{{}}}", headers.join(", "))?;
        }
        if let Some(payload) = &self.request_payload {
            write!(f, " request={payload}")?;
        }
        if let Some(body) = &self.response_body {
            write!(f, " response={body}")?;
        }
        if let Some(error) = &self.error {
            write!(f, " error={error}")?;
        }
        Ok(())
    }
}

fn summarize(text: &str) -> String {
    let total = text.chars().count();
    if total <= MAX_LOGGED_BODY {
        return text.to_string();
    }
    let kept: String = text.chars().take(MAX_LOGGED_BODY).collect();
    format!("{kept}…({} more chars)", total - MAX_LOGGED_BODY)
}
